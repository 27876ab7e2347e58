pub mod ops;
pub mod session;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::account::auth::hash_password;
use crate::account::AccountStore;
use crate::config::MstoreConfig;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "mstore")]
#[command(about = "MStore account ledger", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "mstore.toml")]
    pub config: PathBuf,

    /// Account store file, overrides `store.path`
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Directory for per-user transaction logs, overrides `store.transactions_dir`
    #[arg(long)]
    pub transactions_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Create the first admin account in an empty store
    InitAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Print the stored form of a password
    HashPassword { password: String },
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut MstoreConfig) {
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
        if let Some(dir) = &self.transactions_dir {
            config.store.transactions_dir = dir.clone();
        }
    }
}

pub fn handle_command(cmd: Commands, config: &MstoreConfig) -> Result<()> {
    match cmd {
        Commands::InitAdmin { username, password } => {
            let store = AccountStore::from_config(&config.store);
            ops::bootstrap_admin(&store, &username, &password)?;
            println!("Admin account '{}' created in {}", username, store.path().display());
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password));
        }
    }
    Ok(())
}
