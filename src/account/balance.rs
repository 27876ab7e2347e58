//! Balance arithmetic for deposits and withdrawals

use rust_decimal::Decimal;
use std::str::FromStr;

use super::types::Account;
use crate::error::{MstoreError, Result};

/// Decimal places kept for every amount and balance
pub const CURRENCY_DP: u32 = 2;

/// Parse a user-entered amount. Accepts an optional leading `$`; the value
/// must be positive after rounding to cents.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let amount = Decimal::from_str(digits)
        .map_err(|_| MstoreError::InvalidAmount(trimmed.to_string()))?
        .round_dp(CURRENCY_DP);

    if amount <= Decimal::ZERO {
        return Err(MstoreError::InvalidAmount(format!(
            "{} (amount must be greater than zero)",
            trimmed
        )));
    }
    Ok(amount)
}

/// Parse a balance set directly by an admin. Zero is allowed, negative is not.
pub fn parse_balance(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let balance = Decimal::from_str(digits)
        .map_err(|_| MstoreError::InvalidAmount(trimmed.to_string()))?
        .round_dp(CURRENCY_DP);

    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(MstoreError::InvalidAmount(format!(
            "{} (balance must not be negative)",
            trimmed
        )));
    }
    Ok(balance)
}

/// Credit (add) an amount to the account, returning the new balance
pub fn credit(account: &mut Account, amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(MstoreError::InvalidAmount(amount.to_string()));
    }

    let new_balance = account
        .balance
        .checked_add(amount)
        .ok_or_else(|| MstoreError::InvalidAmount(format!("{} overflows the balance", amount)))?;

    account.balance = new_balance;
    Ok(new_balance)
}

/// Debit (subtract) an amount. The balance is left untouched when it would
/// go negative.
pub fn debit(account: &mut Account, amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(MstoreError::InvalidAmount(amount.to_string()));
    }

    if account.balance < amount {
        return Err(MstoreError::InsufficientFunds {
            balance: account.balance,
            requested: amount,
        });
    }

    account.balance -= amount;
    Ok(account.balance)
}

/// `$1234.50` style rendering used by every balance message
pub fn format_currency(amount: Decimal) -> String {
    format!("${:.2}", amount)
}
