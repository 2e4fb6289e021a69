//! Team and admin authentication.
//!
//! Teams authenticate with their access code in the `X-Access-Code` header.
//! The admin logs in with the password whose argon2 hash is configured under
//! `[admin] password_hash` and receives the `[admin] token` to present as a
//! bearer token.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    Json,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::AppState;
use super::error::WebError;
use crate::domain::desk;
use crate::domain::team::{Team, TeamSummary};
use crate::domain::valuation::PortfolioSnapshot;

pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// Team resolved by [`require_team`], available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedTeam(pub Team);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLoginRequest {
    pub access_code: String,
}

#[derive(Serialize)]
pub struct TeamLoginResponse {
    pub team: TeamSummary,
    pub portfolio: PortfolioSnapshot,
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub token: String,
    pub token_type: &'static str,
}

fn resolve_team(state: &AppState, access_code: &str) -> Result<Team, WebError> {
    let code = access_code.trim();
    if code.is_empty() {
        return Err(WebError::unauthorized("missing access code"));
    }
    state
        .holdings
        .team_by_access_code(code)?
        .ok_or_else(|| WebError::unauthorized("unknown access code"))
}

pub async fn require_team(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let code = request
        .headers()
        .get(ACCESS_CODE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WebError::unauthorized("missing access code"))?;
    let team = resolve_team(&state, code)?;
    request.extensions_mut().insert(AuthenticatedTeam(team));
    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let expected = state
        .config
        .get_string("admin", "token")
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| WebError::unauthorized("admin access is not configured"))?;

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WebError::unauthorized("missing bearer token"))?;

    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(WebError::unauthorized("malformed authorization header"));
    };
    let matches: bool = token
        .trim()
        .as_bytes()
        .ct_eq(expected.trim().as_bytes())
        .into();
    if !scheme.eq_ignore_ascii_case("Bearer") || !matches {
        return Err(WebError::unauthorized("invalid bearer token"));
    }

    Ok(next.run(request).await)
}

pub async fn team_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TeamLoginRequest>,
) -> Result<Json<TeamLoginResponse>, WebError> {
    let team = resolve_team(&state, &payload.access_code)?;
    let portfolio = desk::portfolio(state.prices.as_ref(), state.holdings.as_ref(), team.id)?;
    tracing::info!(team_id = team.id, "team logged in");
    Ok(Json(TeamLoginResponse {
        team: TeamSummary::from(&team),
        portfolio,
    }))
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, WebError> {
    let (Some(hash), Some(token)) = (
        state.config.get_string("admin", "password_hash"),
        state.config.get_string("admin", "token"),
    ) else {
        return Err(WebError::unauthorized("admin login is not configured"));
    };

    let parsed = PasswordHash::new(hash.trim())
        .map_err(|_| WebError::internal("admin password hash is malformed"))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        tracing::warn!("admin login failed");
        return Err(WebError::unauthorized("invalid password"));
    }

    tracing::info!("admin logged in");
    Ok(Json(AdminLoginResponse {
        token: token.trim().to_string(),
        token_type: "Bearer",
    }))
}
