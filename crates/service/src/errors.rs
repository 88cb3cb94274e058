use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Classify a driver error; "no such row" becomes `NotFound`.
    pub fn from_db(entity: &str, err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => Self::not_found(entity),
            other => Self::Db(other.to_string()),
        }
    }

    /// True for errors the caller caused (bad input), as opposed to storage failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Model(models::errors::ModelError::Validation(_)))
    }
}
