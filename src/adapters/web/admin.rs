//! Admin route handlers: price book maintenance, team management, direct
//! position grants and startup equity.
//!
//! Every route here sits behind [`super::auth::require_admin`].

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::WebError;
use crate::domain::config_validation::game_settings;
use crate::domain::desk;
use crate::domain::error::CashCrashError;
use crate::domain::instrument::{
    Company, CompanyEdit, CompanyId, Currency, CurrencyEdit, CurrencyId, Instrument, NewCompany,
    NewCurrency, QuoteUpdate,
};
use crate::domain::settlement::Order;
use crate::domain::team::{NewStartupGrant, StartupGrant, Team, TeamId, generate_access_code};
use crate::domain::valuation::PortfolioSnapshot;

/// Attempts at drawing an unused access code before giving up.
const ACCESS_CODE_ATTEMPTS: usize = 16;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPrice {
    pub buy_price: Decimal,
    #[serde(default)]
    pub sell_price: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub buy_rate: Decimal,
    #[serde(default)]
    pub sell_rate: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamRequest {
    pub name: String,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub cash: Option<Decimal>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cash: Option<Decimal>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeRequest {
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPosition {
    pub company_id: CompanyId,
    pub shares: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyPosition {
    pub currency_id: CurrencyId,
    pub amount: Decimal,
}

/// A team as the admin sees it: access code included.
#[derive(Serialize)]
pub struct TeamDetail {
    pub team: Team,
    pub portfolio: PortfolioSnapshot,
}

fn team_detail_of(state: &AppState, team_id: TeamId) -> Result<TeamDetail, CashCrashError> {
    let team = state.holdings.team(team_id)?;
    let portfolio = desk::portfolio(state.prices.as_ref(), state.holdings.as_ref(), team_id)?;
    Ok(TeamDetail { team, portfolio })
}

// Companies

pub async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Company>>, WebError> {
    Ok(Json(state.prices.list_companies()?))
}

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), WebError> {
    let company = state.prices.add_company(new)?;
    tracing::info!(company_id = company.id, symbol = %company.symbol, "company listed");
    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn edit_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompanyId>,
    Json(edit): Json<CompanyEdit>,
) -> Result<Json<Company>, WebError> {
    let company = state.prices.update_company(id, edit)?;
    tracing::info!(company_id = id, "company edited");
    Ok(Json(company))
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompanyId>,
) -> Result<StatusCode, WebError> {
    desk::delist(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        Instrument::Stock(id),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_company_price(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CompanyId>,
    Json(price): Json<CompanyPrice>,
) -> Result<Json<Company>, WebError> {
    let company = state
        .prices
        .set_company_price(id, price.buy_price, price.sell_price)?;
    tracing::info!(
        company_id = id,
        buy = %company.buy_price,
        sell = %company.sell_price,
        "company price set"
    );
    Ok(Json(company))
}

pub async fn bulk_company_prices(
    State(state): State<Arc<AppState>>,
    Json(updates): Json<Vec<QuoteUpdate>>,
) -> Result<Json<Vec<Company>>, WebError> {
    let companies = state.prices.set_company_prices(&updates)?;
    tracing::info!(count = companies.len(), "company prices updated");
    Ok(Json(companies))
}

// Currencies

pub async fn list_currencies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Currency>>, WebError> {
    Ok(Json(state.prices.list_currencies()?))
}

pub async fn create_currency(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCurrency>,
) -> Result<(StatusCode, Json<Currency>), WebError> {
    let currency = state.prices.add_currency(new)?;
    tracing::info!(currency_id = currency.id, code = %currency.code, "currency listed");
    Ok((StatusCode::CREATED, Json(currency)))
}

pub async fn edit_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CurrencyId>,
    Json(edit): Json<CurrencyEdit>,
) -> Result<Json<Currency>, WebError> {
    let currency = state.prices.update_currency(id, edit)?;
    tracing::info!(currency_id = id, "currency edited");
    Ok(Json(currency))
}

pub async fn delete_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CurrencyId>,
) -> Result<StatusCode, WebError> {
    desk::delist(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        Instrument::Currency(id),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_currency_rate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<CurrencyId>,
    Json(rate): Json<CurrencyRate>,
) -> Result<Json<Currency>, WebError> {
    let currency = state
        .prices
        .set_currency_rate(id, rate.buy_rate, rate.sell_rate)?;
    tracing::info!(
        currency_id = id,
        buy = %currency.buy_rate,
        sell = %currency.sell_rate,
        "currency rate set"
    );
    Ok(Json(currency))
}

pub async fn bulk_currency_rates(
    State(state): State<Arc<AppState>>,
    Json(updates): Json<Vec<QuoteUpdate>>,
) -> Result<Json<Vec<Currency>>, WebError> {
    let currencies = state.prices.set_currency_rates(&updates)?;
    tracing::info!(count = currencies.len(), "currency rates updated");
    Ok(Json(currencies))
}

// Teams

pub async fn list_teams(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Team>>, WebError> {
    Ok(Json(state.holdings.teams()?))
}

fn register_with_generated_code(
    state: &AppState,
    name: &str,
    cash: Decimal,
) -> Result<Team, CashCrashError> {
    let mut rng = rand::thread_rng();
    for _ in 0..ACCESS_CODE_ATTEMPTS {
        let code = generate_access_code(&mut rng);
        match state.holdings.create_team(name, &code, cash) {
            Err(CashCrashError::AccessCodeTaken) => continue,
            other => return other,
        }
    }
    Err(CashCrashError::AccessCodeTaken)
}

pub async fn create_team(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewTeamRequest>,
) -> Result<(StatusCode, Json<TeamDetail>), WebError> {
    let cash = match request.cash {
        Some(cash) => cash,
        None => game_settings(state.config.as_ref())?.starting_cash,
    };
    let team = match request.access_code.as_deref() {
        Some(code) => state.holdings.create_team(&request.name, code, cash)?,
        None => register_with_generated_code(&state, &request.name, cash)?,
    };
    tracing::info!(team_id = team.id, name = %team.name, %cash, "team created");
    Ok((StatusCode::CREATED, Json(team_detail_of(&state, team.id)?)))
}

pub async fn team_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
) -> Result<Json<TeamDetail>, WebError> {
    Ok(Json(team_detail_of(&state, id)?))
}

pub async fn edit_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(edit): Json<TeamEdit>,
) -> Result<Json<TeamDetail>, WebError> {
    // Both fields are checked before either is written.
    if let Some(cash) = edit.cash {
        if cash < Decimal::ZERO {
            return Err(CashCrashError::InvalidInput {
                reason: format!("cash {cash} is negative"),
            }
            .into());
        }
    }
    if edit.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(CashCrashError::InvalidInput {
            reason: "team name must not be empty".into(),
        }
        .into());
    }
    if let Some(cash) = edit.cash {
        state.holdings.update(id, &mut |h| h.set_cash(cash))?;
    }
    if let Some(name) = edit.name.as_deref() {
        state.holdings.rename_team(id, name)?;
    }
    tracing::info!(team_id = id, "team edited");
    Ok(Json(team_detail_of(&state, id)?))
}

pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
) -> Result<Json<Team>, WebError> {
    let team = state.holdings.remove_team(id)?;
    tracing::info!(team_id = id, name = %team.name, "team removed");
    Ok(Json(team))
}

pub async fn reset_access_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(request): Json<AccessCodeRequest>,
) -> Result<Json<Team>, WebError> {
    let team = match request.access_code.as_deref() {
        Some(code) => state.holdings.set_access_code(id, code)?,
        None => {
            let mut rng = rand::thread_rng();
            let mut outcome = Err(CashCrashError::AccessCodeTaken);
            for _ in 0..ACCESS_CODE_ATTEMPTS {
                let code = generate_access_code(&mut rng);
                outcome = state.holdings.set_access_code(id, &code);
                if !matches!(outcome, Err(CashCrashError::AccessCodeTaken)) {
                    break;
                }
            }
            outcome?
        }
    };
    tracing::info!(team_id = id, "access code reset");
    Ok(Json(team))
}

// Positions

pub async fn grant_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<StockPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    Ok(Json(desk::grant_position(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        id,
        Instrument::Stock(position.company_id),
        Decimal::from(position.shares),
    )?))
}

pub async fn revoke_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<StockPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    Ok(Json(desk::revoke_position(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        id,
        Instrument::Stock(position.company_id),
        Decimal::from(position.shares),
    )?))
}

/// Sells the team's shares back at the current sell price.
pub async fn unassign_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<StockPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    let order = Order::sell(
        Instrument::Stock(position.company_id),
        Decimal::from(position.shares),
    );
    let execution = desk::execute_order(state.prices.as_ref(), state.holdings.as_ref(), id, order)?;
    Ok(Json(execution.portfolio))
}

pub async fn grant_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<CurrencyPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    Ok(Json(desk::grant_position(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        id,
        Instrument::Currency(position.currency_id),
        position.amount,
    )?))
}

pub async fn revoke_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<CurrencyPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    Ok(Json(desk::revoke_position(
        state.prices.as_ref(),
        state.holdings.as_ref(),
        id,
        Instrument::Currency(position.currency_id),
        position.amount,
    )?))
}

pub async fn unassign_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(position): Json<CurrencyPosition>,
) -> Result<Json<PortfolioSnapshot>, WebError> {
    let order = Order::sell(Instrument::Currency(position.currency_id), position.amount);
    let execution = desk::execute_order(state.prices.as_ref(), state.holdings.as_ref(), id, order)?;
    Ok(Json(execution.portfolio))
}

// Startup equity

pub async fn assign_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
    Json(grant): Json<NewStartupGrant>,
) -> Result<Json<StartupGrant>, WebError> {
    let grant = state.holdings.set_startup_grant(id, grant)?;
    tracing::info!(team_id = id, startup = %grant.name, value = %grant.value, "startup assigned");
    Ok(Json(grant))
}

pub async fn clear_startup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TeamId>,
) -> Result<StatusCode, WebError> {
    if let Some(grant) = state.holdings.clear_startup_grant(id)? {
        tracing::info!(team_id = id, startup = %grant.name, "startup cleared");
    }
    Ok(StatusCode::NO_CONTENT)
}
