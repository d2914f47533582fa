use std::fmt;

#[derive(Debug)]
pub enum HistoryError {
    Storage(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for HistoryError {}
