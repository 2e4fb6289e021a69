//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{SeedSummary, seed_store};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_store::MemoryStore;
use crate::domain::config_validation::{
    game_settings, listen_addr, seed_paths, validate_server_config,
};
use crate::domain::error::CashCrashError;
use crate::domain::money::round_quote;
use crate::domain::price_book::PriceBook;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_book_port::PriceBookPort;

#[derive(Parser, Debug)]
#[command(name = "cashcrash", about = "Cash or Crash trading game server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed the store and start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration and its seed files
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the seeded price book
    Prices {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Prices { config } => run_prices(&config),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CashCrashError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Validates `config` and builds a store seeded from its `[seed]` files.
///
/// Seed paths are resolved against the directory holding the config file.
pub fn prepare_store(
    config: &dyn ConfigPort,
    config_path: &Path,
) -> Result<(MemoryStore, SeedSummary), CashCrashError> {
    validate_server_config(config)?;
    let settings = game_settings(config)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let paths = seed_paths(config, base_dir)?;

    let store = MemoryStore::new(PriceBook::new(settings.default_spread_pct));
    let summary = seed_store(&store, &paths, &settings)?;
    Ok((store, summary))
}

fn fail(err: &CashCrashError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (summary, addr, settings) = match prepare_store(&config, config_path)
        .and_then(|(_, summary)| Ok((summary, listen_addr(&config)?, game_settings(&config)?)))
    {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    println!("Listen:        {addr}");
    println!("Starting cash: {}", settings.starting_cash);
    println!("Spread:        {}%", settings.default_spread_pct);
    println!("Companies:     {}", summary.companies);
    println!("Currencies:    {}", summary.currencies);
    println!("Teams:         {}", summary.teams);
    println!("Config OK");
    ExitCode::SUCCESS
}

fn run_prices(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (store, _) = match prepare_store(&config, config_path) {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };
    let book = match store.snapshot() {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    println!("{:<4} {:<8} {:<28} {:>12} {:>12}", "ID", "SYMBOL", "COMPANY", "BUY", "SELL");
    for c in book.companies() {
        println!(
            "{:<4} {:<8} {:<28} {:>12} {:>12}",
            c.id,
            c.symbol,
            c.name,
            round_quote(c.buy_price),
            round_quote(c.sell_price)
        );
    }
    println!();
    println!("{:<4} {:<8} {:<28} {:>12} {:>12}", "ID", "CODE", "CURRENCY", "BUY", "SELL");
    for c in book.currencies() {
        println!(
            "{:<4} {:<8} {:<28} {:>12} {:>12}",
            c.id,
            c.code,
            c.name,
            round_quote(c.buy_rate),
            round_quote(c.sell_rate)
        );
    }
    ExitCode::SUCCESS
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::sync::Arc;
        use tracing_subscriber::EnvFilter;

        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .try_init();

        tracing::info!(config = %config_path.display(), "loading config");
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };
        let (store, _) = match prepare_store(&config, config_path) {
            Ok(v) => v,
            Err(e) => return fail(&e),
        };
        let addr = match listen_addr(&config) {
            Ok(a) => a,
            Err(e) => return fail(&e),
        };

        let store = Arc::new(store);
        let state = AppState {
            prices: store.clone(),
            holdings: store,
            config: Arc::new(config),
        };
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(r) => r,
            Err(e) => return fail(&CashCrashError::Io(e)),
        };
        let served: std::io::Result<()> = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "web server listening");
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&CashCrashError::Io(e)),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_hash_password() -> ExitCode {
    #[cfg(feature = "web")]
    {
        use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
        use rand::rngs::OsRng;
        use std::io::{self, BufRead};

        eprintln!("Enter password to hash:");
        let password = match io::stdin().lock().lines().next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return fail(&CashCrashError::Io(e)),
            None => String::new(),
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        match argon2.hash_password(password.as_bytes(), &salt) {
            Ok(hash) => {
                println!("{hash}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(&CashCrashError::Internal {
                reason: format!("hashing failed: {e}"),
            }),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        eprintln!("error: web feature is required for hash-password");
        ExitCode::from(1)
    }
}
