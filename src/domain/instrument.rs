//! Tradable instruments: listed companies and currencies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type CompanyId = u64;
pub type CurrencyId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stock,
    Currency,
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentKind::Stock => f.write_str("company"),
            InstrumentKind::Currency => f.write_str("currency"),
        }
    }
}

/// Reference to one instrument in the price book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Stock(CompanyId),
    Currency(CurrencyId),
}

impl Instrument {
    pub fn new(kind: InstrumentKind, id: u64) -> Self {
        match kind {
            InstrumentKind::Stock => Instrument::Stock(id),
            InstrumentKind::Currency => Instrument::Currency(id),
        }
    }

    pub fn kind(&self) -> InstrumentKind {
        match self {
            Instrument::Stock(_) => InstrumentKind::Stock,
            Instrument::Currency(_) => InstrumentKind::Currency,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Instrument::Stock(id) | Instrument::Currency(id) => *id,
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// A listed company. `buy_price >= sell_price` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub symbol: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub dividend_pct: Decimal,
    pub description: String,
    pub logo: Option<String>,
}

impl Company {
    pub fn spread(&self) -> Decimal {
        self.buy_price - self.sell_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: CurrencyId,
    pub name: String,
    pub code: String,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub logo: Option<String>,
}

impl Currency {
    pub fn spread(&self) -> Decimal {
        self.buy_rate - self.sell_rate
    }
}

/// Fields for listing a new company. A missing sell price takes the default spread.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub name: String,
    pub symbol: String,
    pub buy_price: Decimal,
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub dividend_pct: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCurrency {
    pub name: String,
    pub code: String,
    pub buy_rate: Decimal,
    #[serde(default)]
    pub sell_rate: Option<Decimal>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Descriptive edits to a company. Prices go through the price-setting path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyEdit {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub dividend_pct: Option<Decimal>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyEdit {
    pub name: Option<String>,
    pub code: Option<String>,
    pub logo: Option<String>,
}

/// One entry of a price update; `id` is a company or currency id depending on context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteUpdate {
    pub id: u64,
    pub buy: Decimal,
    #[serde(default)]
    pub sell: Option<Decimal>,
}
