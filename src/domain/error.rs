//! Domain error types.

use rust_decimal::Decimal;

use super::instrument::InstrumentKind;

/// Top-level error type for cashcrash.
#[derive(Debug, thiserror::Error)]
pub enum CashCrashError {
    #[error("invalid quantity: {reason}")]
    InvalidQuantity { reason: String },

    #[error("invalid price: {reason}")]
    InvalidPrice { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("{kind} {id} not found")]
    InstrumentNotFound { kind: InstrumentKind, id: u64 },

    #[error("team {id} not found")]
    TeamNotFound { id: u64 },

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("insufficient holdings: requested {requested}, holding {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },

    #[error("access code already in use")]
    AccessCodeTaken,

    #[error("{kind} {id} is still held by {holders} team(s)")]
    InstrumentInUse {
        kind: InstrumentKind,
        id: u64,
        holders: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("seed file {file}, line {line}: {reason}")]
    Seed {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CashCrashError {
    /// Stable machine-readable name, used as the `kind` of API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CashCrashError::InvalidQuantity { .. } => "InvalidQuantity",
            CashCrashError::InvalidPrice { .. } => "InvalidPrice",
            CashCrashError::InvalidInput { .. } => "InvalidInput",
            CashCrashError::InstrumentNotFound { .. } => "InstrumentNotFound",
            CashCrashError::TeamNotFound { .. } => "TeamNotFound",
            CashCrashError::InsufficientFunds { .. } => "InsufficientFunds",
            CashCrashError::InsufficientHoldings { .. } => "InsufficientHoldings",
            CashCrashError::AccessCodeTaken => "AccessCodeTaken",
            CashCrashError::InstrumentInUse { .. } => "InstrumentInUse",
            CashCrashError::ConfigParse { .. } => "ConfigParse",
            CashCrashError::ConfigMissing { .. } => "ConfigMissing",
            CashCrashError::ConfigInvalid { .. } => "ConfigInvalid",
            CashCrashError::Seed { .. } => "Seed",
            CashCrashError::Internal { .. } => "Internal",
            CashCrashError::Io(_) => "Io",
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        CashCrashError::Internal {
            reason: format!("{what} lock poisoned"),
        }
    }
}

impl From<&CashCrashError> for std::process::ExitCode {
    fn from(err: &CashCrashError) -> Self {
        let code: u8 = match err {
            CashCrashError::Io(_) | CashCrashError::Internal { .. } => 1,
            CashCrashError::ConfigParse { .. }
            | CashCrashError::ConfigMissing { .. }
            | CashCrashError::ConfigInvalid { .. } => 2,
            CashCrashError::Seed { .. } => 3,
            _ => 4,
        };
        std::process::ExitCode::from(code)
    }
}
