use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MindmateError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User not authenticated")]
    NotAuthenticated,
}

pub type MindmateResult<T> = std::result::Result<T, MindmateError>;
