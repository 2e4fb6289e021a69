//! Per-team positions: cash, stock lots, currency lots and a startup grant.
//!
//! There is exactly one lot per (team, instrument). Buying more of an
//! instrument grows the existing lot; a lot that reaches zero is dropped.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::error::CashCrashError;
use super::instrument::{CompanyId, CurrencyId, Instrument};
use super::team::{StartupGrant, TeamId};

#[derive(Debug, Clone, PartialEq)]
pub struct TeamHoldings {
    pub team_id: TeamId,
    cash: Decimal,
    stocks: BTreeMap<CompanyId, u64>,
    currencies: BTreeMap<CurrencyId, Decimal>,
    startup: Option<StartupGrant>,
}

impl TeamHoldings {
    pub fn new(team_id: TeamId, cash: Decimal) -> Result<Self, CashCrashError> {
        if cash < Decimal::ZERO {
            return Err(CashCrashError::InvalidInput {
                reason: format!("opening cash {cash} is negative"),
            });
        }
        Ok(TeamHoldings {
            team_id,
            cash,
            stocks: BTreeMap::new(),
            currencies: BTreeMap::new(),
            startup: None,
        })
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Adds `delta` to cash, refusing to go below zero or past `Decimal::MAX`.
    pub fn adjust_cash(&mut self, delta: Decimal) -> Result<Decimal, CashCrashError> {
        let next = self
            .cash
            .checked_add(delta)
            .ok_or_else(|| CashCrashError::InvalidQuantity {
                reason: format!("cash balance {} cannot absorb {delta}", self.cash),
            })?;
        if next < Decimal::ZERO {
            return Err(CashCrashError::InsufficientFunds {
                required: -delta,
                available: self.cash,
            });
        }
        self.cash = next;
        Ok(next)
    }

    /// Sets cash outright (admin correction).
    pub fn set_cash(&mut self, cash: Decimal) -> Result<(), CashCrashError> {
        if cash < Decimal::ZERO {
            return Err(CashCrashError::InvalidInput {
                reason: format!("cash balance {cash} is negative"),
            });
        }
        self.cash = cash;
        Ok(())
    }

    pub fn stock_lot(&self, company_id: CompanyId) -> u64 {
        self.stocks.get(&company_id).copied().unwrap_or(0)
    }

    pub fn adjust_stock_lot(
        &mut self,
        company_id: CompanyId,
        delta: i64,
    ) -> Result<u64, CashCrashError> {
        let held = self.stock_lot(company_id);
        let next = held.checked_add_signed(delta).ok_or_else(|| {
            if delta > 0 {
                CashCrashError::InvalidQuantity {
                    reason: format!("lot of {held} shares cannot grow by {delta}"),
                }
            } else {
                CashCrashError::InsufficientHoldings {
                    requested: Decimal::from(delta.unsigned_abs()),
                    held: Decimal::from(held),
                }
            }
        })?;
        if next == 0 {
            self.stocks.remove(&company_id);
        } else {
            self.stocks.insert(company_id, next);
        }
        Ok(next)
    }

    pub fn currency_lot(&self, currency_id: CurrencyId) -> Decimal {
        self.currencies
            .get(&currency_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn adjust_currency_lot(
        &mut self,
        currency_id: CurrencyId,
        delta: Decimal,
    ) -> Result<Decimal, CashCrashError> {
        let held = self.currency_lot(currency_id);
        let next = held
            .checked_add(delta)
            .ok_or_else(|| CashCrashError::InvalidQuantity {
                reason: format!("lot of {held} cannot grow by {delta}"),
            })?;
        if next < Decimal::ZERO {
            return Err(CashCrashError::InsufficientHoldings {
                requested: -delta,
                held,
            });
        }
        if next.is_zero() {
            self.currencies.remove(&currency_id);
        } else {
            self.currencies.insert(currency_id, next);
        }
        Ok(next)
    }

    /// Quantity held of any instrument, as a decimal.
    pub fn held(&self, instrument: Instrument) -> Decimal {
        match instrument {
            Instrument::Stock(id) => Decimal::from(self.stock_lot(id)),
            Instrument::Currency(id) => self.currency_lot(id),
        }
    }

    /// Stock lots with shares > 0, ordered by company id.
    pub fn stock_lots(&self) -> impl Iterator<Item = (CompanyId, u64)> + '_ {
        self.stocks.iter().map(|(id, shares)| (*id, *shares))
    }

    /// Currency lots with amount > 0, ordered by currency id.
    pub fn currency_lots(&self) -> impl Iterator<Item = (CurrencyId, Decimal)> + '_ {
        self.currencies.iter().map(|(id, amount)| (*id, *amount))
    }

    pub fn holds(&self, instrument: Instrument) -> bool {
        match instrument {
            Instrument::Stock(id) => self.stocks.contains_key(&id),
            Instrument::Currency(id) => self.currencies.contains_key(&id),
        }
    }

    pub fn startup_grant(&self) -> Option<&StartupGrant> {
        self.startup.as_ref()
    }

    /// Replaces any existing grant.
    pub fn set_startup_grant(&mut self, grant: StartupGrant) -> Option<StartupGrant> {
        self.startup.replace(grant)
    }

    pub fn clear_startup_grant(&mut self) -> Option<StartupGrant> {
        self.startup.take()
    }
}
