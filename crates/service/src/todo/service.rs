use std::sync::Arc;

use async_trait::async_trait;
use models::todo::{Model as Todo, NewTodo};
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::instrument;

use crate::errors::ServiceError;
use crate::todo::repository::TodoRepository;

/// Operations the HTTP layer may invoke on todos.
///
/// This is the place for business rules (e.g. refusing to delete completed
/// items); today every call goes straight to the repository.
#[async_trait]
pub trait TodoUseCase: Send + Sync {
    async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError>;
    async fn get_all(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError>;
    async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError>;
    async fn delete(&self, id: i32) -> Result<(), ServiceError>;
    async fn mark_completed(
        &self,
        id: i32,
        completed: bool,
        at: DateTimeWithTimeZone,
    ) -> Result<(), ServiceError>;
    async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError>;
    async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError>;
}

/// Todo business service independent of web framework
pub struct TodoService<R: TodoRepository> {
    repo: Arc<R>,
}

impl<R: TodoRepository> TodoService<R> {
    /// # Examples
    /// ```
    /// use service::todo::{repository::mock::MockTodoRepository, TodoService, TodoUseCase};
    /// use models::todo::NewTodo;
    /// use std::sync::Arc;
    /// let svc = TodoService::new(Arc::new(MockTodoRepository::default()));
    /// let todo = tokio_test::block_on(svc.create(&NewTodo::new("Buy milk", None).unwrap())).unwrap();
    /// assert!(!todo.completed);
    /// ```
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoUseCase for TodoService<R> {
    #[instrument(skip(self, input), fields(title = %input.title()))]
    async fn create(&self, input: &NewTodo) -> Result<Todo, ServiceError> {
        self.repo.create(input).await
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Todo>, ServiceError> {
        self.repo.get_all().await
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Todo, ServiceError> {
        self.repo.get_by_id(id).await
    }

    #[instrument(skip(self, todo), fields(id = todo.id))]
    async fn update(&self, todo: &Todo) -> Result<Todo, ServiceError> {
        self.repo.update(todo).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.repo.delete(id).await
    }

    #[instrument(skip(self))]
    async fn mark_completed(
        &self,
        id: i32,
        completed: bool,
        at: DateTimeWithTimeZone,
    ) -> Result<(), ServiceError> {
        self.repo.mark_completed(id, completed, at).await
    }

    #[instrument(skip(self))]
    async fn get_completed(&self) -> Result<Vec<Todo>, ServiceError> {
        self.repo.get_completed().await
    }

    #[instrument(skip(self))]
    async fn get_uncompleted(&self) -> Result<Vec<Todo>, ServiceError> {
        self.repo.get_uncompleted().await
    }

    #[instrument(skip(self))]
    async fn search_by_title(&self, query: &str) -> Result<Vec<Todo>, ServiceError> {
        self.repo.search_by_title(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::repo::SeaOrmTodoRepository;
    use crate::todo::repository::mock::MockTodoRepository;
    use crate::test_support::get_db;
    use chrono::Utc;
    use models::todo::TodoPatch;

    fn mock_service() -> TodoService<MockTodoRepository> {
        TodoService::new(Arc::new(MockTodoRepository::default()))
    }

    #[tokio::test]
    async fn delegates_create_and_lookup() {
        let svc = mock_service();
        let created = svc.create(&NewTodo::new("A", Some("d")).unwrap()).await.unwrap();
        let found = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(svc.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn errors_pass_through_unchanged() {
        let svc = TodoService::new(Arc::new(MockTodoRepository::failing()));
        assert!(matches!(svc.get_completed().await, Err(ServiceError::Db(_))));
        assert!(matches!(mock_service().get_by_id(7).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn load_merge_store_over_sea_orm() -> Result<(), anyhow::Error> {
        let svc = TodoService::new(Arc::new(SeaOrmTodoRepository::new(get_db().await?)));
        let created = svc.create(&NewTodo::new("A", Some("d"))?).await?;

        let mut loaded = svc.get_by_id(created.id).await?;
        TodoPatch { title: Some(String::new()), description: Some("e".into()) }.apply_to(&mut loaded);
        let stored = svc.update(&loaded).await?;
        assert_eq!(stored.title, "A");
        assert_eq!(stored.description, "e");

        let at = Utc::now().into();
        let toggled = stored.toggled(at);
        svc.mark_completed(toggled.id, toggled.completed, at).await?;
        assert_eq!(svc.get_completed().await?.len(), 1);
        assert!(svc.get_uncompleted().await?.is_empty());
        Ok(())
    }
}
