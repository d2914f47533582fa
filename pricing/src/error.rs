use std::fmt;

#[derive(Debug)]
pub enum PricingError {
    NotFound,
    Storage(String),
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::NotFound => write!(f, "rate or fee not found"),
            PricingError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for PricingError {}
