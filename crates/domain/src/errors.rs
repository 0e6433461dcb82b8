use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Todo not found: {0}")]
    NotFound(String),
}
