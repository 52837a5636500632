//! Error taxonomy for the query engine.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter, order or key argument does not decode into a recognized
    /// shape. Raised before any database access.
    #[error("invalid {input}: {reason}")]
    InvalidInput { input: &'static str, reason: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("deadline exceeded during {stage}")]
    Timeout { stage: &'static str },
}

impl QueryError {
    pub fn invalid(input: &'static str, reason: impl ToString) -> Self {
        QueryError::InvalidInput {
            input,
            reason: reason.to_string(),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
