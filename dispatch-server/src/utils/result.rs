//! Handler Result Alias
//!
//! Every HTTP handler returns this alias, so error-to-response mapping
//! lives in one place: `AppError`'s `IntoResponse`.

use crate::AppError;

/// Result carried from the dispatch layer through handlers up to axum
pub type AppResult<T> = Result<T, AppError>;
