#![allow(dead_code)]

use cashcrash::adapters::memory_store::MemoryStore;
use cashcrash::domain::instrument::{NewCompany, NewCurrency};
use cashcrash::ports::config_port::ConfigPort;
use cashcrash::ports::holdings_port::HoldingsPort;
use cashcrash::ports::price_book_port::PriceBookPort;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::str::FromStr;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const BULLS_CODE: &str = "BULLS1";
pub const BEARS_CODE: &str = "BEARS1";

pub struct MockConfigPort {
    pub values: HashMap<(String, String), String>,
}

impl MockConfigPort {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, section: &str, key: &str, value: &str) -> Self {
        self.values
            .insert((section.to_string(), key.to_string()), value.to_string());
        self
    }

    /// Config with the admin token set and everything else defaulted.
    pub fn game() -> Self {
        Self::new().with("admin", "token", ADMIN_TOKEN)
    }
}

impl ConfigPort for MockConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.values
            .get(&(section.to_string(), key.to_string()))
            .cloned()
    }

    fn get_decimal(&self, section: &str, key: &str) -> Option<Decimal> {
        self.get_string(section, key)
            .and_then(|v| Decimal::from_str(&v).ok())
    }
}

pub fn company(name: &str, symbol: &str, buy: Decimal, sell: Option<Decimal>) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        symbol: symbol.to_string(),
        buy_price: buy,
        sell_price: sell,
        dividend_pct: Decimal::ZERO,
        description: String::new(),
        logo: None,
    }
}

pub fn currency(name: &str, code: &str, buy: Decimal, sell: Option<Decimal>) -> NewCurrency {
    NewCurrency {
        name: name.to_string(),
        code: code.to_string(),
        buy_rate: buy,
        sell_rate: sell,
        logo: None,
    }
}

/// Store with two companies, two currencies and two teams.
///
/// Company 1 Acme 100.00/98.00, company 2 Globex 50.00/derived.
/// Currency 1 EUR 1.38/1.35, currency 2 JPY 0.0068/derived.
/// Team 1 Bulls with 10000.00, team 2 Bears with 50.00.
pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::default();
    store
        .add_company(company("Acme", "ACM", dec!(100.00), Some(dec!(98.00))))
        .unwrap();
    store
        .add_company(company("Globex", "GLX", dec!(50.00), None))
        .unwrap();
    store
        .add_currency(currency("Euro", "EUR", dec!(1.38), Some(dec!(1.35))))
        .unwrap();
    store
        .add_currency(currency("Japanese Yen", "JPY", dec!(0.0068), None))
        .unwrap();
    store.create_team("Bulls", BULLS_CODE, dec!(10000.00)).unwrap();
    store.create_team("Bears", BEARS_CODE, dec!(50.00)).unwrap();
    store
}

#[cfg(feature = "web")]
pub mod http {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, Response, header},
    };
    use cashcrash::adapters::web::{ACCESS_CODE_HEADER, AppState, build_router};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;

    pub fn app_with(store: MemoryStore, config: MockConfigPort) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let state = AppState {
            prices: store.clone(),
            holdings: store.clone(),
            config: Arc::new(config),
        };
        (build_router(state), store)
    }

    pub fn app() -> (Router, Arc<MemoryStore>) {
        app_with(seeded_store(), MockConfigPort::game())
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn as_team(mut request: Request<Body>, access_code: &str) -> Request<Body> {
        request
            .headers_mut()
            .insert(ACCESS_CODE_HEADER, access_code.parse().unwrap());
        request
    }

    pub fn as_admin(mut request: Request<Body>) -> Request<Body> {
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {ADMIN_TOKEN}").parse().unwrap(),
        );
        request
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Reads a decimal serialized as a JSON string (or number) at `pointer`.
    pub fn dec_at(value: &Value, pointer: &str) -> Decimal {
        match value.pointer(pointer) {
            Some(Value::String(s)) => Decimal::from_str(s).unwrap(),
            Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).unwrap(),
            other => panic!("no decimal at {pointer}: {other:?}"),
        }
    }
}
