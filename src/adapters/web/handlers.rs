//! Public and team route handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::Uri,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::auth::AuthenticatedTeam;
use super::error::WebError;
use crate::domain::desk;
use crate::domain::instrument::{Company, Currency, Instrument, InstrumentKind};
use crate::domain::leaderboard::LeaderboardEntry;
use crate::domain::settlement::{Order, Side};
use crate::domain::valuation::PortfolioSnapshot;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub kind: InstrumentKind,
    pub instrument_id: u64,
    pub quantity: Decimal,
    pub side: Side,
}

impl TradeRequest {
    fn into_order(self) -> Order {
        Order {
            instrument: Instrument::new(self.kind, self.instrument_id),
            side: self.side,
            quantity: self.quantity,
        }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Company>>, WebError> {
    Ok(Json(state.prices.list_companies()?))
}

pub async fn list_currencies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Currency>>, WebError> {
    Ok(Json(state.prices.list_currencies()?))
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>, WebError> {
    Ok(Json(desk::leaderboard(
        state.prices.as_ref(),
        state.holdings.as_ref(),
    )?))
}

pub async fn team_portfolio(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedTeam(team)): Extension<AuthenticatedTeam>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    Ok(Json(desk::portfolio(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        team.id,
    )?))
}

pub async fn place_trade(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedTeam(team)): Extension<AuthenticatedTeam>,
    Json(request): Json<TradeRequest>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    let execution = desk::execute_order(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        team.id,
        request.into_order(),
    )?;
    Ok(Json(execution.portfolio))
}

pub async fn not_found(uri: Uri) -> WebError {
    WebError::not_found(format!("no route for {}", uri.path()))
}
