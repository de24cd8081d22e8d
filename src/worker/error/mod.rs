#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Task processing failed: {0}")]
    ProcessingError(String),

    #[error("Worker pool is at capacity: {0}")]
    CapacityError(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<tokio::sync::AcquireError> for WorkerError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        WorkerError::CapacityError(format!("Failed to acquire worker: {}", err))
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            WorkerError::ProcessingError("Worker job panicked".to_string())
        } else {
            WorkerError::ProcessingError(format!("Worker job was cancelled: {}", err))
        }
    }
}
