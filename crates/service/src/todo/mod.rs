//! Todo module: three-layer architecture (repository, service; HTTP lives in `server`).

pub mod repository;
pub mod service;
pub mod repo;

pub use repository::TodoRepository;
pub use service::{TodoService, TodoUseCase};
