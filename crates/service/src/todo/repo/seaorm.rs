use models::todo::{self, Model as Todo, NewTodo};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use tracing::debug;

use crate::errors::ServiceError;
use crate::todo::repository::TodoRepository;

const ENTITY: &str = "todo";

/// `LIKE` pattern matching `query` literally anywhere in the column.
fn contains_pattern(query: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

/// SeaORM-backed repository implementation.
#[derive(Clone)]
pub struct SeaOrmTodoRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn list_where(&self, completed: Option<bool>) -> Result<Vec<Todo>, ServiceError> {
        let mut finder = todo::Entity::find();
        if let Some(c) = completed { finder = finder.filter(todo::Column::Completed.eq(c)); }
        finder
            .order_by_asc(todo::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TodoRepository for SeaOrmTodoRepository {
    async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError> {
        let created = todo::create(&self.db, input).await?;
        Ok(created)
    }

    async fn get_all(&self) -> Result<Vec<Todo>, ServiceError> {
        self.list_where(None).await
    }

    async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError> {
        todo::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?
            .ok_or_else(|| ServiceError::not_found(ENTITY))
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError> {
        // every column marked dirty so the whole row is written back
        let am = todo.clone().into_active_model().reset_all();
        am.update(&self.db).await.map_err(|e| ServiceError::from_db(ENTITY, e))
    }

    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let res = todo::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        debug!(id, rows_affected = res.rows_affected, "todo delete executed");
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: i32,
        completed: bool,
        at: DateTimeWithTimeZone,
    ) -> Result<(), ServiceError> {
        let res = todo::Entity::update_many()
            .col_expr(todo::Column::Completed, Expr::value(completed))
            .col_expr(todo::Column::CompletedAt, Expr::value(Some(at)))
            .col_expr(todo::Column::UpdatedAt, Expr::value(at))
            .filter(todo::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        debug!(id, completed, rows_affected = res.rows_affected, "todo completion written");
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found(ENTITY));
        }
        Ok(())
    }

    async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError> {
        self.list_where(Some(true)).await
    }

    async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError> {
        self.list_where(Some(false)).await
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError> {
        todo::Entity::find()
            .filter(Expr::col(todo::Column::Title).like(contains_pattern(query)))
            .order_by_asc(todo::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }
}
