//! Convenience result type alias.

use crate::error::AppError;

/// A specialized `Result` type for back-office operations.
pub type AppResult<T> = Result<T, AppError>;
