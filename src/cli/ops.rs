//! Account operations behind the menus. Each takes the session explicitly and
//! checks it before touching the store.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::session::Session;
use crate::account::auth::{hash_password, verify_password};
use crate::account::balance::{credit, debit};
use crate::account::history::{TransactionEntry, TransactionLog};
use crate::account::types::{validate_username, Account, Role};
use crate::account::AccountStore;
use crate::error::{MstoreError, Result};

/// Self-service registration. Always creates a normal account.
pub fn register(store: &AccountStore, username: &str, password: &str, pin: i32) -> Result<Account> {
    validate_password(password)?;
    let account = Account::new(username, hash_password(password), Role::normal(pin)?);
    store.add(&account)?;
    Ok(account)
}

pub fn login(store: &AccountStore, username: &str, password: &str, pin: i32) -> Result<Session> {
    let role = store.authenticate(username, &hash_password(password), pin)?;
    Ok(Session::new(username, role))
}

/// Create the first admin. Refused once the store holds any record.
pub fn bootstrap_admin(store: &AccountStore, username: &str, password: &str) -> Result<Account> {
    if !store.is_empty()? {
        return Err(MstoreError::InvalidInput(
            "the account store already has users; ask an admin to add you".to_string(),
        ));
    }
    validate_password(password)?;
    let admin = Account::new(username, hash_password(password), Role::Admin);
    store.add(&admin)?;
    info!(user = username, "initial admin created");
    Ok(admin)
}

/// Fresh copy of the session's own record
pub fn current_account(store: &AccountStore, session: &Session) -> Result<Account> {
    store
        .load(&session.username)?
        .ok_or_else(|| MstoreError::NotFound(session.username.clone()))
}

/// The balance is saved first. A history entry that cannot be written is
/// reported as a warning and does not undo the deposit.
pub fn deposit(
    store: &AccountStore,
    log: &TransactionLog,
    session: &Session,
    amount: Decimal,
) -> Result<Decimal> {
    let mut account = current_account(store, session)?;
    let balance = credit(&mut account, amount)?;
    store.save(&account)?;
    if let Err(e) = log.append(&account.username, &TransactionEntry::deposit(amount)) {
        warn!(user = %account.username, error = %e, "deposit not recorded in history");
    }
    info!(user = %account.username, %amount, "deposit");
    Ok(balance)
}

/// On insufficient funds nothing is saved and nothing is logged. A history
/// failure after the save is only a warning, as for deposits.
pub fn withdraw(
    store: &AccountStore,
    log: &TransactionLog,
    session: &Session,
    amount: Decimal,
) -> Result<Decimal> {
    let mut account = current_account(store, session)?;
    let balance = debit(&mut account, amount)?;
    store.save(&account)?;
    if let Err(e) = log.append(&account.username, &TransactionEntry::withdrawal(amount)) {
        warn!(user = %account.username, error = %e, "withdrawal not recorded in history");
    }
    info!(user = %account.username, %amount, "withdrawal");
    Ok(balance)
}

pub fn change_password(
    store: &AccountStore,
    session: &Session,
    current: &str,
    new_password: &str,
) -> Result<()> {
    let mut account = current_account(store, session)?;
    if !verify_password(current, &account.password_hash) {
        return Err(MstoreError::AuthenticationFailed);
    }
    validate_password(new_password)?;

    account.password_hash = hash_password(new_password);
    store.save(&account)?;
    info!(user = %account.username, "password changed");
    Ok(())
}

pub fn transaction_history(log: &TransactionLog, session: &Session) -> Result<Vec<String>> {
    log.read(&session.username)
}

/// Admin: add a user of either role
pub fn add_user(
    store: &AccountStore,
    session: &Session,
    username: &str,
    password: &str,
    role: Role,
) -> Result<Account> {
    session.require_admin("add new users")?;
    validate_username(username)?;
    validate_password(password)?;
    let account = Account::new(username, hash_password(password), role);
    store.add(&account)?;
    Ok(account)
}

pub fn delete_user(store: &AccountStore, session: &Session, username: &str) -> Result<()> {
    session.require_admin("delete users")?;
    store.delete(username)
}

/// Admin: replace password, PIN and balance. PIN 0 makes the user an admin.
pub fn edit_user(
    store: &AccountStore,
    session: &Session,
    username: &str,
    new_password: &str,
    pin: i32,
    balance: Decimal,
) -> Result<Account> {
    session.require_admin("edit user details")?;
    validate_password(new_password)?;
    if balance < Decimal::ZERO {
        return Err(MstoreError::InvalidAmount(format!("{} (balance must not be negative)", balance)));
    }
    store.edit_fields(username, hash_password(new_password), pin, balance)
}

fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(MstoreError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::types::UserRole;
    use std::fs;

    struct Fixture {
        store: AccountStore,
        log: TransactionLog,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("mstore-ops-{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            Self {
                store: AccountStore::new(dir.join("account.txt"), true),
                log: TransactionLog::new(dir),
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(self.log.dir());
        }
    }

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn test_alice_walkthrough() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();

        let session = login(&fx.store, "alice", "pw1", 1234).unwrap();
        assert_eq!(session.role, UserRole::Normal);
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, Decimal::ZERO);

        assert_eq!(deposit(&fx.store, &fx.log, &session, dec("50.00")).unwrap(), dec("50.00"));
        assert_eq!(withdraw(&fx.store, &fx.log, &session, dec("20.00")).unwrap(), dec("30.00"));
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, dec("30.00"));

        let history = transaction_history(&fx.log, &session).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].starts_with("Deposit: +50.00"));
        assert!(history[1].starts_with("Withdrawal: -20.00"));
    }

    #[test]
    fn test_register_existing_username_fails() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        let before = fs::read(fx.store.path()).unwrap();

        assert!(matches!(
            register(&fx.store, "alice", "other", 1),
            Err(MstoreError::AlreadyExists(_))
        ));
        assert_eq!(fs::read(fx.store.path()).unwrap(), before);
        assert!(login(&fx.store, "alice", "pw1", 1234).is_ok());
    }

    #[test]
    fn test_register_rejects_admin_pin() {
        let fx = Fixture::new();
        assert!(matches!(
            register(&fx.store, "mallory", "pw", 0),
            Err(MstoreError::InvalidInput(_))
        ));
        assert!(fx.store.is_empty().unwrap());
    }

    #[test]
    fn test_wrong_pin_fails() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        assert!(matches!(
            login(&fx.store, "alice", "pw1", 4321),
            Err(MstoreError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_overdraw_leaves_balance_and_history() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        let session = login(&fx.store, "alice", "pw1", 1234).unwrap();
        deposit(&fx.store, &fx.log, &session, dec("10.00")).unwrap();

        assert!(matches!(
            withdraw(&fx.store, &fx.log, &session, dec("10.01")),
            Err(MstoreError::InsufficientFunds { .. })
        ));
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, dec("10.00"));
        assert_eq!(transaction_history(&fx.log, &session).unwrap().len(), 1);
    }

    #[test]
    fn test_deposit_survives_missing_history_dir() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        let session = login(&fx.store, "alice", "pw1", 1234).unwrap();
        let log = TransactionLog::new(fx.log.dir().join("missing-subdir"));

        assert_eq!(deposit(&fx.store, &log, &session, dec("50.00")).unwrap(), dec("50.00"));
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, dec("50.00"));

        assert_eq!(withdraw(&fx.store, &log, &session, dec("20.00")).unwrap(), dec("30.00"));
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, dec("30.00"));
        assert!(transaction_history(&log, &session).unwrap().is_empty());
    }

    #[test]
    fn test_deposit_withdraw_round_trip() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        let session = login(&fx.store, "alice", "pw1", 1234).unwrap();
        deposit(&fx.store, &fx.log, &session, dec("0.10")).unwrap();
        let before = current_account(&fx.store, &session).unwrap().balance;

        deposit(&fx.store, &fx.log, &session, dec("0.20")).unwrap();
        withdraw(&fx.store, &fx.log, &session, dec("0.20")).unwrap();
        assert_eq!(current_account(&fx.store, &session).unwrap().balance, before);
    }

    #[test]
    fn test_change_password() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        let session = login(&fx.store, "alice", "pw1", 1234).unwrap();

        assert!(matches!(
            change_password(&fx.store, &session, "nope", "pw2"),
            Err(MstoreError::AuthenticationFailed)
        ));
        change_password(&fx.store, &session, "pw1", "pw2").unwrap();

        assert!(login(&fx.store, "alice", "pw1", 1234).is_err());
        assert!(login(&fx.store, "alice", "pw2", 1234).is_ok());
        assert_eq!(
            current_account(&fx.store, &session).unwrap().password_hash,
            hash_password("pw2")
        );
    }

    #[test]
    fn test_admin_operations() {
        let fx = Fixture::new();
        bootstrap_admin(&fx.store, "root", "toor").unwrap();
        let admin = login(&fx.store, "root", "toor", 999).unwrap();
        assert!(admin.is_admin());

        add_user(&fx.store, &admin, "bob", "pw", Role::Normal { pin: 42 }).unwrap();
        add_user(&fx.store, &admin, "ops", "pw", Role::Admin).unwrap();

        let bob = edit_user(&fx.store, &admin, "bob", "fresh", 77, dec("12.50")).unwrap();
        assert_eq!(bob.balance, dec("12.50"));
        assert!(login(&fx.store, "bob", "fresh", 77).is_ok());

        delete_user(&fx.store, &admin, "bob").unwrap();
        assert!(matches!(
            delete_user(&fx.store, &admin, "bob"),
            Err(MstoreError::NotFound(_))
        ));
        assert_eq!(fx.store.record_count().unwrap(), 2);
    }

    #[test]
    fn test_normal_session_cannot_administer() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        register(&fx.store, "bob", "pw2", 42).unwrap();
        let alice = login(&fx.store, "alice", "pw1", 1234).unwrap();

        assert!(matches!(
            add_user(&fx.store, &alice, "eve", "pw", Role::Admin),
            Err(MstoreError::PermissionDenied(_))
        ));
        assert!(matches!(
            delete_user(&fx.store, &alice, "bob"),
            Err(MstoreError::PermissionDenied(_))
        ));
        assert!(matches!(
            edit_user(&fx.store, &alice, "bob", "x", 1, Decimal::ZERO),
            Err(MstoreError::PermissionDenied(_))
        ));
        assert_eq!(fx.store.record_count().unwrap(), 2);
    }

    #[test]
    fn test_bootstrap_refused_when_populated() {
        let fx = Fixture::new();
        register(&fx.store, "alice", "pw1", 1234).unwrap();
        assert!(bootstrap_admin(&fx.store, "root", "toor").is_err());
        assert!(fx.store.load("root").unwrap().is_none());
    }
}
