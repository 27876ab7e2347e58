use std::fmt::Display;
use std::io::{BufRead, Write};

use crate::account::balance::{format_currency, parse_amount, parse_balance};
use crate::account::types::Role;
use crate::account::{AccountStore, TransactionLog};
use crate::cli::ops;
use crate::cli::session::Session;
use crate::config::MstoreConfig;
use crate::error::{MstoreError, Result};

/// Line-oriented prompt/response over any reader and writer
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// One trimmed line. End of input ends the session.
    fn prompt(&mut self, label: &str) -> Result<String> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MstoreError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// First whitespace-separated word, asking again on blank lines
    fn prompt_word(&mut self, label: &str) -> Result<String> {
        loop {
            let line = self.prompt(label)?;
            if let Some(word) = line.split_whitespace().next() {
                return Ok(word.to_string());
            }
        }
    }

    fn prompt_integer(&mut self, label: &str) -> Result<i32> {
        loop {
            match self.prompt(label)?.parse::<i32>() {
                Ok(n) => return Ok(n),
                Err(_) => self.say("Invalid input. Please enter a valid integer.")?,
            }
        }
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        let answer = self.prompt(label)?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Interactive front end: main menu, admin menu, user menu
pub struct App {
    store: AccountStore,
    log: TransactionLog,
}

impl App {
    pub fn new(store: AccountStore, log: TransactionLog) -> Self {
        Self { store, log }
    }

    pub fn from_config(config: &MstoreConfig) -> Self {
        Self::new(
            AccountStore::from_config(&config.store),
            TransactionLog::new(config.store.transactions_dir.clone()),
        )
    }

    /// Runs until the user exits or input ends
    pub fn run<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        match self.main_menu(console) {
            Err(MstoreError::InputClosed) => Ok(()),
            other => other,
        }
    }

    fn main_menu<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        self.offer_admin_setup(console)?;

        loop {
            console.say("===== WELCOME TO MSTORE =====")?;
            console.say("1. Login")?;
            console.say("2. Register")?;
            console.say("3. Exit")?;

            match console.prompt_integer("Enter your choice: ")? {
                1 => {
                    if let Some(session) = self.login(console)? {
                        if session.is_admin() {
                            console.say("Authentication successful. Welcome, Admin!")?;
                            self.admin_menu(console, &session)?;
                        } else {
                            console.say(format!(
                                "Authentication successful. Welcome, {}!",
                                session.username
                            ))?;
                            self.user_menu(console, &session)?;
                        }
                    }
                }
                2 => self.register(console)?,
                3 => {
                    console.say("Goodbye.")?;
                    return Ok(());
                }
                _ => console.say("Invalid choice. Please enter 1 to login, 2 to register or 3 to exit.")?,
            }
            console.say("")?;
        }
    }

    fn offer_admin_setup<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        let empty = match self.store.is_empty() {
            Ok(empty) => empty,
            Err(e) => return report(console, Err::<(), _>(e)).map(|_| ()),
        };
        if !empty || !console.confirm("No accounts found. Set up an admin account now (y/n)? ")? {
            return Ok(());
        }

        let username = console.prompt_word("Enter admin username: ")?;
        let password = console.prompt_word("Enter admin password: ")?;
        if report(console, ops::bootstrap_admin(&self.store, &username, &password))?.is_some() {
            console.say("Admin account created successfully.")?;
        }
        Ok(())
    }

    fn login<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<Option<Session>> {
        let username = console.prompt_word("Enter your username: ")?;
        let password = console.prompt_word("Enter your password: ")?;
        let pin = console.prompt_integer("Enter your PIN (enter 0 if not applicable): ")?;

        report(console, ops::login(&self.store, &username, &password, pin))
    }

    fn register<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        let username = console.prompt_word("Enter new username: ")?;
        let password = console.prompt_word(&format!("Enter password for {}: ", username))?;
        let pin = console.prompt_integer(&format!("Enter PIN for {}: ", username))?;

        if report(console, ops::register(&self.store, &username, &password, pin))?.is_some() {
            console.say("User added successfully.")?;
        }
        Ok(())
    }

    fn admin_menu<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, session: &Session) -> Result<()> {
        loop {
            console.say("")?;
            console.say("===== ADMIN MENU =====")?;
            console.say("1. Add User")?;
            console.say("2. Delete User")?;
            console.say("3. View All Users")?;
            console.say("4. Edit User")?;
            console.say("5. Exit")?;

            match console.prompt_integer("Enter your choice: ")? {
                1 => self.add_user(console, session)?,
                2 => {
                    let username = console.prompt_word("Enter username to delete: ")?;
                    if report(console, ops::delete_user(&self.store, session, &username))?.is_some() {
                        console.say(format!("User {} deleted successfully.", username))?;
                    }
                }
                3 => self.view_all_users(console, session)?,
                4 => self.edit_user(console, session)?,
                5 => {
                    console.say("Exiting Admin menu.")?;
                    return Ok(());
                }
                _ => console.say("Invalid choice. Please enter a valid option.")?,
            }
        }
    }

    fn add_user<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, session: &Session) -> Result<()> {
        let username = console.prompt_word("Enter new username: ")?;
        match report(console, self.store.load(&username))? {
            Some(None) => {}
            Some(Some(_)) => return console.say(MstoreError::AlreadyExists(username)),
            None => return Ok(()),
        }
        let password = console.prompt_word(&format!("Enter password for {}: ", username))?;

        let role = if console.confirm("Is this user an admin (y/n)? ")? {
            Role::Admin
        } else {
            let pin = console.prompt_integer(&format!("Enter PIN for {}: ", username))?;
            match report(console, Role::normal(pin))? {
                Some(role) => role,
                None => return Ok(()),
            }
        };

        if report(console, ops::add_user(&self.store, session, &username, &password, role))?.is_some() {
            console.say("User added successfully.")?;
        }
        Ok(())
    }

    fn view_all_users<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, session: &Session) -> Result<()> {
        let Some(usernames) = report(console, self.store.list_usernames(session))? else {
            return Ok(());
        };

        console.say("===== LIST OF USERS =====")?;
        for username in usernames {
            match report(console, username)? {
                Some(username) => console.say(username)?,
                None => break,
            }
        }
        Ok(())
    }

    fn edit_user<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, session: &Session) -> Result<()> {
        let username = console.prompt_word("Enter username to edit: ")?;
        match report(console, self.store.load(&username))? {
            Some(Some(_)) => {}
            Some(None) => return console.say(MstoreError::NotFound(username)),
            None => return Ok(()),
        }

        console.say(format!("Editing details for user {}", username))?;
        let password = console.prompt_word("Enter new password: ")?;
        let pin = console.prompt_integer("Enter new PIN (0 makes the user an admin): ")?;
        let balance_text = console.prompt("Enter new balance: $")?;
        let Some(balance) = report(console, parse_balance(&balance_text))? else {
            return Ok(());
        };

        let edited = ops::edit_user(&self.store, session, &username, &password, pin, balance);
        if report(console, edited)?.is_some() {
            console.say(format!("User {} edited successfully.", username))?;
        }
        Ok(())
    }

    fn user_menu<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, session: &Session) -> Result<()> {
        loop {
            console.say("")?;
            console.say("===== USER MENU =====")?;
            console.say("1. Check Balance")?;
            console.say("2. Deposit Money")?;
            console.say("3. Withdraw Money")?;
            console.say("4. View Account Details")?;
            console.say("5. Change Password")?;
            console.say("6. View Transaction History")?;
            console.say("7. Exit")?;

            match console.prompt_integer("Enter your choice: ")? {
                1 => {
                    if let Some(account) = report(console, ops::current_account(&self.store, session))? {
                        console.say(format!("Your balance is: {}", format_currency(account.balance)))?;
                    }
                }
                2 => {
                    let text = console.prompt("Enter amount to deposit: $")?;
                    let result = parse_amount(&text)
                        .and_then(|amount| ops::deposit(&self.store, &self.log, session, amount));
                    if let Some(balance) = report(console, result)? {
                        console.say(format!(
                            "Deposit successful. Your new balance is: {}",
                            format_currency(balance)
                        ))?;
                    }
                }
                3 => {
                    let text = console.prompt("Enter amount to withdraw: $")?;
                    let result = parse_amount(&text)
                        .and_then(|amount| ops::withdraw(&self.store, &self.log, session, amount));
                    if let Some(balance) = report(console, result)? {
                        console.say(format!(
                            "Withdrawal successful. Your new balance is: {}",
                            format_currency(balance)
                        ))?;
                    }
                }
                4 => {
                    if let Some(account) = report(console, ops::current_account(&self.store, session))? {
                        console.say(format!("Username: {}", account.username))?;
                        console.say(format!("Balance: {}", format_currency(account.balance)))?;
                    }
                }
                5 => {
                    let current = console.prompt_word("Enter current password: ")?;
                    let new_password = console.prompt_word("Enter new password: ")?;
                    match ops::change_password(&self.store, session, &current, &new_password) {
                        Ok(()) => console.say("Password changed successfully.")?,
                        Err(MstoreError::AuthenticationFailed) => console.say("Incorrect current password.")?,
                        Err(e) => {
                            report(console, Err::<(), _>(e))?;
                        }
                    }
                }
                6 => {
                    if let Some(lines) = report(console, ops::transaction_history(&self.log, session))? {
                        console.say("===== TRANSACTION HISTORY =====")?;
                        if lines.is_empty() {
                            console.say("No transactions yet.")?;
                        }
                        for line in lines {
                            console.say(line)?;
                        }
                    }
                }
                7 => {
                    console.say("Exiting User menu.")?;
                    return Ok(());
                }
                _ => console.say("Invalid choice. Please enter a valid option.")?,
            }
        }
    }
}

/// Print a failed operation and carry on. Only a closed input or a broken
/// console escapes.
fn report<T, R: BufRead, W: Write>(console: &mut Console<R, W>, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MstoreError::InputClosed) => Err(MstoreError::InputClosed),
        Err(e) => {
            console.say(&e)?;
            Ok(None)
        }
    }
}
