//! Dispatch workflow errors

use crate::db::models::OrderStatus;
use crate::db::repository::RepoError;
use crate::utils::AppError;
use thiserror::Error;

/// Errors surfaced by the dispatch workflow
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Illegal lifecycle transition; carries the current status so clients
    /// can diagnose what they raced against
    #[error("Cannot {action} while order is {current}")]
    InvalidTransition {
        current: OrderStatus,
        action: &'static str,
    },

    /// Lost the assignment race to another agent
    #[error("Order {0} is already assigned to another delivery agent")]
    AlreadyAssigned(String),

    /// Requester is not the actor this transition belongs to
    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Validation(msg) => AppError::Validation(msg),
            DispatchError::NotFound(msg) => AppError::NotFound(msg),
            DispatchError::InvalidTransition { .. } => AppError::InvalidTransition(e.to_string()),
            DispatchError::AlreadyAssigned(msg) => {
                AppError::AlreadyAssigned(format!("Order {msg} already taken"))
            }
            DispatchError::Forbidden(msg) => AppError::Forbidden(msg),
            DispatchError::Repo(RepoError::NotFound(msg)) => AppError::NotFound(msg),
            DispatchError::Repo(RepoError::Validation(msg)) => AppError::Validation(msg),
            DispatchError::Repo(RepoError::Database(msg)) => AppError::Database(msg),
        }
    }
}
