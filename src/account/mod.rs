//! Account system for MStore
//!
//! - Flat-file account store, one record per line
//! - SHA-256 password hashing
//! - Deposit / withdrawal arithmetic on decimal balances
//! - Per-user transaction history files

pub mod types;
pub mod store;
pub mod balance;
pub mod auth;
pub mod history;

pub use types::{Account, Role};
pub use store::AccountStore;
pub use history::TransactionLog;
