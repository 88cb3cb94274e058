use async_trait::async_trait;
use models::todo::{Model as Todo, NewTodo};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::errors::ServiceError;

/// Storage gateway for todos. Each method is one statement against the store
/// and carries no business rules.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError>;
    async fn get_all(&self) -> Result<Vec<Todo>, ServiceError>;
    /// `NotFound` when no row has this id.
    async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError>;
    /// Full-row write: every column is overwritten from `todo`, so the caller
    /// must pass a completely loaded entity. `updated_at` is restamped.
    async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError>;
    /// Deleting a missing id is not an error.
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;
    /// Targeted write of `completed`/`completed_at` (and `updated_at`) only.
    /// `NotFound` when no row was touched.
    async fn mark_completed(
        &self,
        id: i32,
        completed: bool,
        at: DateTimeWithTimeZone,
    ) -> Result<(), ServiceError>;
    async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError>;
    /// Substring match on title.
    async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct State {
        rows: BTreeMap<i32, Todo>, // key: id
        last_id: i32,
    }

    #[derive(Default)]
    pub struct MockTodoRepository {
        state: Mutex<State>,
        failing: bool,
    }

    impl MockTodoRepository {
        /// Repository whose every call fails like an unreachable database.
        pub fn failing() -> Self {
            Self { state: Mutex::default(), failing: true }
        }

        fn check(&self) -> Result<(), ServiceError> {
            if self.failing {
                return Err(ServiceError::Db("connection refused".into()));
            }
            Ok(())
        }

        async fn filtered(&self, keep: impl Fn(&Todo) -> bool) -> Result<Vec<Todo>, ServiceError> {
            self.check()?;
            let state = self.state.lock().await;
            Ok(state.rows.values().filter(|&t| keep(t)).cloned().collect())
        }
    }

    #[async_trait]
    impl TodoRepository for MockTodoRepository {
        async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError> {
            self.check()?;
            let mut state = self.state.lock().await;
            state.last_id += 1;
            let now: DateTimeWithTimeZone = Utc::now().into();
            let todo = Todo {
                id: state.last_id,
                title: input.title().to_string(),
                description: input.description().to_string(),
                completed: false,
                created_at: now,
                updated_at: now,
                completed_at: None,
            };
            state.rows.insert(todo.id, todo.clone());
            Ok(todo)
        }

        async fn get_all(&self) -> Result<Vec<Todo>, ServiceError> {
            self.filtered(|_| true).await
        }

        async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError> {
            self.check()?;
            let state = self.state.lock().await;
            state.rows.get(&id).cloned().ok_or_else(|| ServiceError::not_found("todo"))
        }

        async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError> {
            self.check()?;
            let mut state = self.state.lock().await;
            let Some(slot) = state.rows.get_mut(&todo.id) else {
                return Err(ServiceError::not_found("todo"));
            };
            *slot = Todo { updated_at: Utc::now().into(), ..todo.clone() };
            Ok(slot.clone())
        }

        async fn delete(&self, id: i32) -> Result<(), ServiceError> {
            self.check()?;
            self.state.lock().await.rows.remove(&id);
            Ok(())
        }

        async fn mark_completed(
            &self,
            id: i32,
            completed: bool,
            at: DateTimeWithTimeZone,
        ) -> Result<(), ServiceError> {
            self.check()?;
            let mut state = self.state.lock().await;
            let Some(slot) = state.rows.get_mut(&id) else {
                return Err(ServiceError::not_found("todo"));
            };
            slot.completed = completed;
            slot.completed_at = Some(at);
            slot.updated_at = at;
            Ok(())
        }

        async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError> {
            self.filtered(|t| t.completed).await
        }

        async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError> {
            self.filtered(|t| !t.completed).await
        }

        async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError> {
            self.filtered(|t| t.title.contains(query)).await
        }
    }

}
