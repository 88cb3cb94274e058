//! Create `todo` table.
//! One row per todo item; `id` is assigned by the database.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(pk_auto(Todo::Id))
                    .col(string(Todo::Title))
                    .col(text(Todo::Description).default(""))
                    .col(boolean(Todo::Completed).default(false))
                    .col(timestamp_with_time_zone(Todo::CreatedAt))
                    .col(timestamp_with_time_zone(Todo::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Todo::CompletedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Todo::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Todo {
    Table,
    Id,
    Title,
    Description,
    Completed,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
