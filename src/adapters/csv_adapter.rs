//! CSV seed files for the price book and team registry.
//!
//! companies.csv:  name,symbol,buy_price,sell_price,dividend_pct,description,logo
//! currencies.csv: name,code,buy_rate,sell_rate,logo
//! teams.csv:      name,access_code,cash
//!
//! Blank `sell_price`/`sell_rate` take the default spread; blank `cash`
//! takes the configured starting cash.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::config_validation::{GameSettings, SeedPaths};
use crate::domain::error::CashCrashError;
use crate::domain::instrument::{NewCompany, NewCurrency};
use crate::ports::holdings_port::HoldingsPort;
use crate::ports::price_book_port::PriceBookPort;

#[derive(Debug, Deserialize)]
struct CompanyRow {
    name: String,
    symbol: String,
    buy_price: Decimal,
    sell_price: Option<Decimal>,
    dividend_pct: Option<Decimal>,
    description: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CurrencyRow {
    name: String,
    code: String,
    buy_rate: Decimal,
    sell_rate: Option<Decimal>,
    logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamSeed {
    pub name: String,
    pub access_code: String,
    pub cash: Option<Decimal>,
}

/// Counts of what a seeding run loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub companies: usize,
    pub currencies: usize,
    pub teams: usize,
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R, label: &str) -> Result<Vec<T>, CashCrashError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.map_err(|e| CashCrashError::Seed {
            file: label.to_string(),
            line: e.position().map_or(0, |p| p.line()),
            reason: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<File, CashCrashError> {
    File::open(path).map_err(|e| CashCrashError::Seed {
        file: path.display().to_string(),
        line: 0,
        reason: e.to_string(),
    })
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

pub fn parse_companies<R: Read>(reader: R, label: &str) -> Result<Vec<NewCompany>, CashCrashError> {
    Ok(read_rows::<CompanyRow, _>(reader, label)?
        .into_iter()
        .map(|row| NewCompany {
            name: row.name,
            symbol: row.symbol,
            buy_price: row.buy_price,
            sell_price: row.sell_price,
            dividend_pct: row.dividend_pct.unwrap_or(Decimal::ZERO),
            description: row.description.unwrap_or_default(),
            logo: blank_to_none(row.logo),
        })
        .collect())
}

pub fn parse_currencies<R: Read>(
    reader: R,
    label: &str,
) -> Result<Vec<NewCurrency>, CashCrashError> {
    Ok(read_rows::<CurrencyRow, _>(reader, label)?
        .into_iter()
        .map(|row| NewCurrency {
            name: row.name,
            code: row.code,
            buy_rate: row.buy_rate,
            sell_rate: row.sell_rate,
            logo: blank_to_none(row.logo),
        })
        .collect())
}

pub fn parse_teams<R: Read>(reader: R, label: &str) -> Result<Vec<TeamSeed>, CashCrashError> {
    read_rows(reader, label)
}

pub fn load_companies(path: &Path) -> Result<Vec<NewCompany>, CashCrashError> {
    parse_companies(open(path)?, &path.display().to_string())
}

pub fn load_currencies(path: &Path) -> Result<Vec<NewCurrency>, CashCrashError> {
    parse_currencies(open(path)?, &path.display().to_string())
}

pub fn load_teams(path: &Path) -> Result<Vec<TeamSeed>, CashCrashError> {
    parse_teams(open(path)?, &path.display().to_string())
}

/// Loads every configured seed file into the store.
pub fn seed_store<S>(
    store: &S,
    paths: &SeedPaths,
    settings: &GameSettings,
) -> Result<SeedSummary, CashCrashError>
where
    S: PriceBookPort + HoldingsPort + ?Sized,
{
    let mut summary = SeedSummary::default();

    if let Some(path) = &paths.companies {
        for company in load_companies(path)? {
            store.add_company(company)?;
            summary.companies += 1;
        }
    }
    if let Some(path) = &paths.currencies {
        for currency in load_currencies(path)? {
            store.add_currency(currency)?;
            summary.currencies += 1;
        }
    }
    if let Some(path) = &paths.teams {
        for team in load_teams(path)? {
            let cash = team.cash.unwrap_or(settings.starting_cash);
            store.create_team(&team.name, &team.access_code, cash)?;
            summary.teams += 1;
        }
    }

    tracing::info!(
        companies = summary.companies,
        currencies = summary.currencies,
        teams = summary.teams,
        "store seeded"
    );
    Ok(summary)
}
