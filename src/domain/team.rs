//! Teams and startup equity grants.

use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CashCrashError;

pub type TeamId = u64;

/// Length of generated access codes.
pub const ACCESS_CODE_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub access_code: String,
}

/// Public view of a team, without its access code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        TeamSummary {
            id: team.id,
            name: team.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    High,
}

impl std::str::FromStr for RiskLevel {
    type Err = CashCrashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "medium-high" | "medium high" | "mediumhigh" => Ok(RiskLevel::MediumHigh),
            "high" => Ok(RiskLevel::High),
            other => Err(CashCrashError::InvalidInput {
                reason: format!("unknown risk level '{other}'"),
            }),
        }
    }
}

/// Startup equity held by a team. At most one per team.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupGrant {
    pub id: u64,
    pub team_id: TeamId,
    pub name: String,
    pub description: String,
    pub value: Decimal,
    pub industry: String,
    pub risk_level: RiskLevel,
}

/// Admin input for assigning a startup grant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStartupGrant {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: Decimal,
    #[serde(default)]
    pub industry: String,
    pub risk_level: RiskLevel,
}

impl NewStartupGrant {
    pub fn validate(&self) -> Result<(), CashCrashError> {
        if self.name.trim().is_empty() {
            return Err(CashCrashError::InvalidInput {
                reason: "startup name must not be empty".into(),
            });
        }
        if self.value < Decimal::ZERO {
            return Err(CashCrashError::InvalidInput {
                reason: format!("startup value {} is negative", self.value),
            });
        }
        Ok(())
    }
}

/// Checks a team display name and access code before they enter the registry.
pub fn validate_team_fields(name: &str, access_code: &str) -> Result<(), CashCrashError> {
    if name.trim().is_empty() {
        return Err(CashCrashError::InvalidInput {
            reason: "team name must not be empty".into(),
        });
    }
    validate_access_code(access_code)
}

pub fn validate_access_code(access_code: &str) -> Result<(), CashCrashError> {
    if access_code.trim().is_empty() {
        return Err(CashCrashError::InvalidInput {
            reason: "access code must not be empty".into(),
        });
    }
    if access_code.chars().any(char::is_whitespace) {
        return Err(CashCrashError::InvalidInput {
            reason: "access code must not contain whitespace".into(),
        });
    }
    Ok(())
}

/// Random upper-case alphanumeric access code.
pub fn generate_access_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(ACCESS_CODE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}
