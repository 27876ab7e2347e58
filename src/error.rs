use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MstoreError {
    #[error("Unable to open account store '{}': {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("User {0} does not exist.")]
    NotFound(String),
    #[error("Username {0} already exists. Please choose a different username.")]
    AlreadyExists(String),
    #[error("Authentication failed. Invalid username, password or PIN.")]
    AuthenticationFailed,
    #[error("Only admin can {0}.")]
    PermissionDenied(&'static str),
    #[error("Insufficient funds. Balance is ${balance:.2}, requested ${requested:.2}.")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Input closed")]
    InputClosed,
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MstoreError>;
