use std::fmt;

#[derive(Debug)]
pub enum LedgerError {
    AccountNotFound(String),
    InsufficientFunds { account: String, asset: String },
    InvalidAmount,
    Storage(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::AccountNotFound(account) => write!(f, "account not found: {account}"),
            LedgerError::InsufficientFunds { .. } => {
                write!(f, "not enough balance for transfer")
            }
            LedgerError::InvalidAmount => write!(f, "invalid amount"),
            LedgerError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}
