use clap::Parser;
use std::fs::OpenOptions;
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mstore::cli::{self, Cli};
use mstore::config::{LoggingConfig, MstoreConfig};
use mstore::error::Result;
use mstore::interactive::{App, Console};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = MstoreConfig::load_or_default(&cli.config);
    cli.apply_overrides(&mut config);

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Could not open log file '{}': {}", config.logging.file, e);
    }
    info!(store = %config.store.path.display(), "mstore starting");

    let result = match cli.command {
        Some(cmd) => cli::handle_command(cmd, &config),
        None => run_interactive(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mstore exiting with failure");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_interactive(config: &MstoreConfig) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    App::from_config(config).run(&mut console)
}

/// `RUST_LOG` wins over the configured level. Logs go to the configured file
/// so they stay out of the menus; an empty file name means stderr.
fn init_logging(logging: &LoggingConfig) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    match OpenOptions::new().create(true).append(true).open(&logging.file) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            Ok(())
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            Err(e)
        }
    }
}
