use std::fmt;

#[derive(Debug)]
pub enum BusError {
    Publish(String),
    Consume(String),
    Decode(String),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Publish(msg) => write!(f, "publish error: {msg}"),
            BusError::Consume(msg) => write!(f, "consume error: {msg}"),
            BusError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for BusError {}
