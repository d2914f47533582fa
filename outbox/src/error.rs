use std::fmt;

#[derive(Debug)]
pub enum OutboxError {
    AlreadyLockedOrNotFound,
    NotFound,
    Storage(String),
}

impl fmt::Display for OutboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboxError::AlreadyLockedOrNotFound => {
                write!(f, "transfer already locked or not found")
            }
            OutboxError::NotFound => write!(f, "transfer not found"),
            OutboxError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for OutboxError {}
