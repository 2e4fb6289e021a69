//! Configuration validation and the settings derived from it.
//!
//! Validates every server setting before the store is seeded or the
//! listener is bound.

use crate::domain::error::CashCrashError;
use crate::domain::price_book::DEFAULT_SPREAD_PCT;
use crate::ports::config_port::ConfigPort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_STARTING_CASH: Decimal = dec!(10000);

/// Game rules taken from the `[game]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub starting_cash: Decimal,
    pub default_spread_pct: Decimal,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            starting_cash: DEFAULT_STARTING_CASH,
            default_spread_pct: DEFAULT_SPREAD_PCT,
        }
    }
}

/// Seed file locations from the `[seed]` section, resolved against the config file's directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPaths {
    pub companies: Option<PathBuf>,
    pub currencies: Option<PathBuf>,
    pub teams: Option<PathBuf>,
}

pub fn validate_server_config(config: &dyn ConfigPort) -> Result<(), CashCrashError> {
    validate_listen(config)?;
    validate_admin(config)?;
    game_settings(config)?;
    Ok(())
}

pub fn listen_addr(config: &dyn ConfigPort) -> Result<SocketAddr, CashCrashError> {
    let raw = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    raw.trim()
        .parse()
        .map_err(|_| CashCrashError::ConfigInvalid {
            section: "web".to_string(),
            key: "listen".to_string(),
            reason: format!("'{raw}' is not a socket address"),
        })
}

fn validate_listen(config: &dyn ConfigPort) -> Result<(), CashCrashError> {
    listen_addr(config).map(|_| ())
}

fn validate_admin(config: &dyn ConfigPort) -> Result<(), CashCrashError> {
    match config.get_string("admin", "token") {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => {
            return Err(CashCrashError::ConfigInvalid {
                section: "admin".to_string(),
                key: "token".to_string(),
                reason: "token must not be empty".to_string(),
            });
        }
        None => {
            return Err(CashCrashError::ConfigMissing {
                section: "admin".to_string(),
                key: "token".to_string(),
            });
        }
    }
    if let Some(hash) = config.get_string("admin", "password_hash") {
        if !hash.trim().starts_with("$argon2") {
            return Err(CashCrashError::ConfigInvalid {
                section: "admin".to_string(),
                key: "password_hash".to_string(),
                reason: "expected an argon2 PHC string (see `cashcrash hash-password`)"
                    .to_string(),
            });
        }
    }
    Ok(())
}

fn decimal_setting(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Decimal,
) -> Result<Decimal, CashCrashError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(_) => config
            .get_decimal(section, key)
            .ok_or_else(|| CashCrashError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: "expected a decimal number".to_string(),
            }),
    }
}

pub fn game_settings(config: &dyn ConfigPort) -> Result<GameSettings, CashCrashError> {
    let starting_cash = decimal_setting(config, "game", "starting_cash", DEFAULT_STARTING_CASH)?;
    if starting_cash < Decimal::ZERO {
        return Err(CashCrashError::ConfigInvalid {
            section: "game".to_string(),
            key: "starting_cash".to_string(),
            reason: "starting_cash must be non-negative".to_string(),
        });
    }

    let default_spread_pct =
        decimal_setting(config, "game", "default_spread_pct", DEFAULT_SPREAD_PCT)?;
    if default_spread_pct < Decimal::ZERO || default_spread_pct >= Decimal::ONE_HUNDRED {
        return Err(CashCrashError::ConfigInvalid {
            section: "game".to_string(),
            key: "default_spread_pct".to_string(),
            reason: "default_spread_pct must be between 0 and 100".to_string(),
        });
    }

    Ok(GameSettings {
        starting_cash,
        default_spread_pct,
    })
}

/// Reads `[seed]` paths relative to `base_dir` and checks that each exists.
pub fn seed_paths(config: &dyn ConfigPort, base_dir: &Path) -> Result<SeedPaths, CashCrashError> {
    let resolve = |key: &str| -> Result<Option<PathBuf>, CashCrashError> {
        let Some(raw) = config
            .get_string("seed", key)
            .filter(|s| !s.trim().is_empty())
        else {
            return Ok(None);
        };
        let path = base_dir.join(raw.trim());
        if !path.is_file() {
            return Err(CashCrashError::ConfigInvalid {
                section: "seed".to_string(),
                key: key.to_string(),
                reason: format!("{} does not exist", path.display()),
            });
        }
        Ok(Some(path))
    };

    Ok(SeedPaths {
        companies: resolve("companies")?,
        currencies: resolve("currencies")?,
        teams: resolve("teams")?,
    })
}
