//! Web server adapter.
//!
//! JSON REST API over the store ports: public price and leaderboard reads,
//! team routes behind the access-code check, and admin routes behind the
//! bearer-token check. Each check is a single middleware layered over its
//! route group.

mod admin;
mod auth;
mod error;
mod handlers;

pub use auth::{ACCESS_CODE_HEADER, AuthenticatedTeam};
pub use error::WebError;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::ports::config_port::ConfigPort;
use crate::ports::holdings_port::HoldingsPort;
use crate::ports::price_book_port::PriceBookPort;

pub struct AppState {
    pub prices: Arc<dyn PriceBookPort + Send + Sync>,
    pub holdings: Arc<dyn HoldingsPort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    let static_dir = state
        .config
        .get_string("web", "static_dir")
        .unwrap_or_else(|| "static".to_string());
    let state = Arc::new(state);

    let team_routes = Router::new()
        .route("/portfolio", get(handlers::team_portfolio))
        .route("/trades", post(handlers::place_trade))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_team,
        ));

    let admin_routes = Router::new()
        .route(
            "/companies",
            get(admin::list_companies).post(admin::create_company),
        )
        .route("/companies/prices", post(admin::bulk_company_prices))
        .route(
            "/companies/{id}",
            put(admin::edit_company).delete(admin::delete_company),
        )
        .route("/companies/{id}/price", put(admin::set_company_price))
        .route(
            "/currencies",
            get(admin::list_currencies).post(admin::create_currency),
        )
        .route("/currencies/rates", post(admin::bulk_currency_rates))
        .route(
            "/currencies/{id}",
            put(admin::edit_currency).delete(admin::delete_currency),
        )
        .route("/currencies/{id}/rate", put(admin::set_currency_rate))
        .route("/teams", get(admin::list_teams).post(admin::create_team))
        .route(
            "/teams/{id}",
            get(admin::team_detail)
                .put(admin::edit_team)
                .delete(admin::delete_team),
        )
        .route("/teams/{id}/access-code", post(admin::reset_access_code))
        .route("/teams/{id}/stocks", post(admin::grant_stock))
        .route("/teams/{id}/stocks/revoke", post(admin::revoke_stock))
        .route("/teams/{id}/stocks/unassign", post(admin::unassign_stock))
        .route("/teams/{id}/currencies", post(admin::grant_currency))
        .route("/teams/{id}/currencies/revoke", post(admin::revoke_currency))
        .route(
            "/teams/{id}/currencies/unassign",
            post(admin::unassign_currency),
        )
        .route(
            "/teams/{id}/startup",
            put(admin::assign_startup).delete(admin::clear_startup),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/companies", get(handlers::list_companies))
        .route("/currencies", get(handlers::list_currencies))
        .route("/leaderboard", get(handlers::leaderboard))
        .route("/login", post(auth::team_login))
        .route("/admin/login", post(auth::admin_login))
        .nest("/team", team_routes)
        .nest("/admin", admin_routes)
        .fallback(handlers::not_found);

    Router::new()
        .nest("/api", api)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
