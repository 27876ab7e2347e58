//! Per-user transaction history, one append-only text file per account

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// ctime-style timestamp, e.g. `Wed Oct 14 09:30:00 2026`
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

/// A single history line
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEntry {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub at: DateTime<Local>,
}

impl TransactionEntry {
    pub fn deposit(amount: Decimal) -> Self {
        Self { kind: TransactionKind::Deposit, amount, at: Local::now() }
    }

    pub fn withdrawal(amount: Decimal) -> Self {
        Self { kind: TransactionKind::Withdrawal, amount, at: Local::now() }
    }

    pub fn to_line(&self) -> String {
        let (label, sign) = match self.kind {
            TransactionKind::Deposit => ("Deposit", '+'),
            TransactionKind::Withdrawal => ("Withdrawal", '-'),
        };
        format!("{}: {}{:.2} on {}", label, sign, self.amount, self.at.format(TIMESTAMP_FORMAT))
    }
}

/// Directory of `<username>_transactions.txt` files
#[derive(Debug, Clone)]
pub struct TransactionLog {
    dir: PathBuf,
}

impl TransactionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}_transactions.txt", username))
    }

    pub fn append(&self, username: &str, entry: &TransactionEntry) -> Result<()> {
        let path = self.path_for(username);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", entry.to_line())?;
        debug!(user = username, path = %path.display(), "transaction logged");
        Ok(())
    }

    /// All history lines, oldest first. No log file means no history yet.
    pub fn read(&self, username: &str) -> Result<Vec<String>> {
        match fs::read_to_string(self.path_for(username)) {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
