use std::sync::Arc;

use service::todo::{TodoRepository, TodoService, TodoUseCase};

/// Shared handler state. The use-case handle wraps the single process-wide
/// connection pool; cloning the state clones an `Arc`.
#[derive(Clone)]
pub struct ServerState {
    pub todos: Arc<dyn TodoUseCase>,
}

impl ServerState {
    pub fn new(todos: Arc<dyn TodoUseCase>) -> Self { Self { todos } }

    /// Wire the default coordinator over any repository.
    pub fn with_repository<R: TodoRepository + 'static>(repo: Arc<R>) -> Self {
        Self::new(Arc::new(TodoService::new(repo)))
    }
}
