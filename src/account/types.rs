//! Account type definitions and the on-disk line format

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::balance::CURRENCY_DP;
use crate::error::{MstoreError, Result};

/// PIN value that marks an admin record on disk
pub const ADMIN_PIN: i32 = 0;

/// Role stored with each account.
///
/// On disk the role is folded into the PIN column (`0` means admin); in
/// memory it is always one of these two variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Normal { pin: i32 },
}

/// Role granted to a logged-in session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Normal,
}

impl Role {
    pub fn from_pin(pin: i32) -> Self {
        if pin == ADMIN_PIN {
            Role::Admin
        } else {
            Role::Normal { pin }
        }
    }

    /// Build a normal-user role, refusing the admin sentinel
    pub fn normal(pin: i32) -> Result<Self> {
        if pin == ADMIN_PIN {
            return Err(MstoreError::InvalidInput(
                "PIN 0 is reserved for admin accounts".to_string(),
            ));
        }
        Ok(Role::Normal { pin })
    }

    pub fn pin(&self) -> i32 {
        match self {
            Role::Admin => ADMIN_PIN,
            Role::Normal { pin } => *pin,
        }
    }

    pub fn user_role(&self) -> UserRole {
        match self {
            Role::Admin => UserRole::Admin,
            Role::Normal { .. } => UserRole::Normal,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Normal => write!(f, "normal"),
        }
    }
}

/// One record of the account store
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub balance: Decimal,
}

impl Account {
    /// New account with a zero balance
    pub fn new(username: &str, password_hash: String, role: Role) -> Self {
        Self {
            username: username.to_string(),
            password_hash,
            role,
            balance: Decimal::ZERO,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Parse a `username hash pin balance` line. Returns `None` for blank or
    /// malformed lines. The balance is rounded to cents so the record reads
    /// back the same after it is rewritten.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let username = fields.next()?;
        let password_hash = fields.next()?;
        let pin = fields.next()?.parse::<i32>().ok()?;
        let balance = Decimal::from_str(fields.next()?).ok()?.round_dp(CURRENCY_DP);
        if fields.next().is_some() {
            return None;
        }

        Some(Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::from_pin(pin),
            balance,
        })
    }

    /// Serialize to the store line format (no trailing newline)
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {:.2}",
            self.username,
            self.password_hash,
            self.role.pin(),
            self.balance
        )
    }
}

/// Username of a well-formed store line. Malformed lines have no owner.
pub fn line_username(line: &str) -> Option<String> {
    Account::parse_line(line).map(|account| account.username)
}

/// Usernames become a whitespace-delimited column and a file name prefix.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(MstoreError::InvalidInput("username must not be empty".to_string()));
    }
    if username.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(MstoreError::InvalidInput(format!(
            "username '{}' must not contain whitespace or path separators",
            username
        )));
    }
    Ok(())
}
