use sea_orm_migration::prelude::*;

use crate::m20220101_000001_create_todo::Todo;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // completed / uncompleted listings filter on this column
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todo_completed")
                    .table(Todo::Table)
                    .col(Todo::Completed)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_todo_completed").table(Todo::Table).to_owned())
            .await
    }
}
