use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// The persistence collaborator was unreachable or returned an error.
    #[error("Failed to load dispatch data: {0}")]
    LoadFailure(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::ValidationError(msg) => AppError::ValidationError(msg),
            DispatchError::LoadFailure(msg) => AppError::ExternalService(msg),
        }
    }
}
