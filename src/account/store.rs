//! Flat-file account storage
//!
//! The whole store is a text file with one `username hash pin balance` record
//! per line. Reads are linear scans. Every mutation streams the file into a
//! scratch copy next to it, editing at most one record on the way, and then
//! renames the scratch copy over the original.

use rust_decimal::Decimal;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::{line_username, validate_username, Account, Role, UserRole};
use crate::cli::session::Session;
use crate::config::StoreConfig;
use crate::error::{MstoreError, Result};

/// What a rewrite does with one existing line
enum LineEdit {
    Keep,
    Replace(String),
    Remove,
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
    create_if_missing: bool,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>, create_if_missing: bool) -> Self {
        Self {
            path: path.into(),
            create_if_missing,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone(), config.create_if_missing)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check credentials against every record in file order.
    ///
    /// An admin record (PIN 0) ignores the supplied PIN. A normal record whose
    /// PIN differs is skipped and the scan continues, so a later record with
    /// the same username and hash can still match.
    pub fn authenticate(&self, username: &str, password_hash: &str, pin: i32) -> Result<UserRole> {
        let role = self.scan(|account| {
            if account.username != username || account.password_hash != password_hash {
                return None;
            }
            let pin_ok = match account.role {
                Role::Admin => true,
                Role::Normal { pin: stored } => stored == pin,
            };
            pin_ok.then(|| account.role.user_role())
        })?;

        match role {
            Some(role) => {
                info!(user = username, %role, "login succeeded");
                Ok(role)
            }
            None => {
                warn!(user = username, "login failed");
                Err(MstoreError::AuthenticationFailed)
            }
        }
    }

    /// First record with this username; `None` when absent
    pub fn load(&self, username: &str) -> Result<Option<Account>> {
        self.scan(|account| (account.username == username).then_some(account))
    }

    /// Insert or replace the record with this username
    pub fn save(&self, account: &Account) -> Result<()> {
        let mut replaced = false;
        let line = account.to_line();
        self.rewrite(
            |_, existing| {
                if !replaced && line_username(existing).as_deref() == Some(account.username.as_str()) {
                    replaced = true;
                    Ok(LineEdit::Replace(line.clone()))
                } else {
                    Ok(LineEdit::Keep)
                }
            },
            Some(line.clone()),
        )?;
        debug!(user = %account.username, "account saved");
        Ok(())
    }

    /// Append a new record. Fails without touching the file if the username
    /// is already taken.
    pub fn add(&self, account: &Account) -> Result<()> {
        validate_username(&account.username)?;
        self.rewrite(
            |_, existing| {
                if line_username(existing).as_deref() == Some(account.username.as_str()) {
                    Err(MstoreError::AlreadyExists(account.username.clone()))
                } else {
                    Ok(LineEdit::Keep)
                }
            },
            Some(account.to_line()),
        )?;
        info!(user = %account.username, admin = account.is_admin(), "account added");
        Ok(())
    }

    /// Remove the first record with this username
    pub fn delete(&self, username: &str) -> Result<()> {
        let mut removed = false;
        let changed = self.rewrite(
            |_, existing| {
                if !removed && line_username(existing).as_deref() == Some(username) {
                    removed = true;
                    Ok(LineEdit::Remove)
                } else {
                    Ok(LineEdit::Keep)
                }
            },
            None,
        )?;

        if !changed {
            return Err(MstoreError::NotFound(username.to_string()));
        }
        info!(user = username, "account deleted");
        Ok(())
    }

    /// Overwrite password hash, PIN and balance of the first matching record.
    /// A PIN of 0 turns the account into an admin.
    pub fn edit_fields(
        &self,
        username: &str,
        password_hash: String,
        pin: i32,
        balance: Decimal,
    ) -> Result<Account> {
        let updated = Account {
            username: username.to_string(),
            password_hash,
            role: Role::from_pin(pin),
            balance,
        };
        let line = updated.to_line();

        let mut edited = false;
        let changed = self.rewrite(
            |_, existing| {
                if !edited && line_username(existing).as_deref() == Some(username) {
                    edited = true;
                    Ok(LineEdit::Replace(line.clone()))
                } else {
                    Ok(LineEdit::Keep)
                }
            },
            None,
        )?;

        if !changed {
            return Err(MstoreError::NotFound(username.to_string()));
        }
        info!(user = username, "account edited");
        Ok(updated)
    }

    /// Lazily yield every username in file order. Admin only.
    pub fn list_usernames(
        &self,
        session: &Session,
    ) -> Result<impl Iterator<Item = Result<String>>> {
        session.require_admin("view all users")?;
        let reader = self.open_reader()?;

        Ok(reader
            .into_iter()
            .flat_map(|reader| reader.lines())
            .filter_map(|line| match line {
                Ok(line) => line_username(&line).map(Ok),
                Err(e) => Some(Err(e.into())),
            }))
    }

    /// Number of well-formed records
    pub fn record_count(&self) -> Result<usize> {
        let mut count = 0;
        self.scan(|_| {
            count += 1;
            None::<()>
        })?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.record_count()? == 0)
    }

    fn open_reader(&self) -> Result<Option<BufReader<File>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound && self.create_if_missing => Ok(None),
            Err(source) => Err(MstoreError::StoreUnavailable {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Visit parsed records until `visit` returns something
    fn scan<T>(&self, mut visit: impl FnMut(Account) -> Option<T>) -> Result<Option<T>> {
        let Some(reader) = self.open_reader()? else {
            return Ok(None);
        };

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(account) = parse_record(index, &line) {
                if let Some(found) = visit(account) {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Stream the store through `visit` into the scratch file. `append` is
    /// written at the end only if no existing line was edited. Returns whether
    /// anything changed; the original file is replaced only in that case.
    fn rewrite<F>(&self, visit: F, append: Option<String>) -> Result<bool>
    where
        F: FnMut(usize, &str) -> Result<LineEdit>,
    {
        let reader = self.open_reader()?;
        let scratch = self.scratch_path();
        let file = File::create(&scratch).map_err(|source| MstoreError::StoreUnavailable {
            path: scratch.clone(),
            source,
        })?;
        let mut out = BufWriter::new(file);

        let result = stream_records(reader, &mut out, visit, append).and_then(|changed| {
            out.flush()?;
            Ok(changed)
        });
        drop(out);

        match result {
            Ok(true) => {
                fs::rename(&scratch, &self.path)?;
                Ok(true)
            }
            Ok(false) => {
                fs::remove_file(&scratch)?;
                Ok(false)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&scratch) {
                    warn!(path = %scratch.display(), error = %cleanup, "could not remove scratch file");
                }
                Err(e)
            }
        }
    }
}

fn stream_records<W, F>(
    reader: Option<BufReader<File>>,
    out: &mut W,
    mut visit: F,
    append: Option<String>,
) -> Result<bool>
where
    W: Write,
    F: FnMut(usize, &str) -> Result<LineEdit>,
{
    let mut edited = false;

    if let Some(reader) = reader {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            match visit(index, &line)? {
                LineEdit::Keep => writeln!(out, "{}", line)?,
                LineEdit::Replace(replacement) => {
                    writeln!(out, "{}", replacement)?;
                    edited = true;
                }
                LineEdit::Remove => edited = true,
            }
        }
    }

    if edited {
        return Ok(true);
    }
    match append {
        Some(line) => {
            writeln!(out, "{}", line)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn parse_record(index: usize, line: &str) -> Option<Account> {
    if line.trim().is_empty() {
        return None;
    }
    let account = Account::parse_line(line);
    if account.is_none() {
        warn!(line = index + 1, "skipping malformed account record");
    }
    account
}
