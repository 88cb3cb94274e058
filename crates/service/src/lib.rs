//! Service layer for todo items.
//! - `todo::repository` is the storage gateway contract, one statement per call.
//! - `todo::service` is the business coordinator the HTTP layer talks to.

pub mod errors;
pub mod todo;
#[cfg(test)]
pub mod test_support;
