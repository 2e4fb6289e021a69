//! Holdings store port: the team registry plus per-team positions.

use rust_decimal::Decimal;

use crate::domain::error::CashCrashError;
use crate::domain::holdings::TeamHoldings;
use crate::domain::instrument::{CompanyId, CurrencyId};
use crate::domain::team::{NewStartupGrant, StartupGrant, Team, TeamId};

pub trait HoldingsPort {
    /// Registers a team with an opening cash balance. Access codes are unique.
    fn create_team(
        &self,
        name: &str,
        access_code: &str,
        cash: Decimal,
    ) -> Result<Team, CashCrashError>;

    fn team(&self, id: TeamId) -> Result<Team, CashCrashError>;

    /// All teams, ordered by id.
    fn teams(&self) -> Result<Vec<Team>, CashCrashError>;

    fn team_by_access_code(&self, access_code: &str) -> Result<Option<Team>, CashCrashError>;

    fn set_access_code(&self, id: TeamId, access_code: &str) -> Result<Team, CashCrashError>;

    fn rename_team(&self, id: TeamId, name: &str) -> Result<Team, CashCrashError>;

    fn remove_team(&self, id: TeamId) -> Result<Team, CashCrashError>;

    /// Copy of the team's holdings as of now.
    fn holdings(&self, id: TeamId) -> Result<TeamHoldings, CashCrashError>;

    /// Runs `f` as one transaction on the team's holdings.
    ///
    /// No other `update` for the same team may interleave with `f`, and a
    /// failed `f` must leave the holdings unchanged. Returns the committed state.
    fn update(
        &self,
        id: TeamId,
        f: &mut dyn FnMut(&mut TeamHoldings) -> Result<(), CashCrashError>,
    ) -> Result<TeamHoldings, CashCrashError>;

    /// Assigns a startup grant, replacing any existing one.
    fn set_startup_grant(
        &self,
        id: TeamId,
        grant: NewStartupGrant,
    ) -> Result<StartupGrant, CashCrashError>;

    fn get_cash(&self, id: TeamId) -> Result<Decimal, CashCrashError> {
        Ok(self.holdings(id)?.cash())
    }

    fn adjust_cash(&self, id: TeamId, delta: Decimal) -> Result<Decimal, CashCrashError> {
        self.update(id, &mut |h| h.adjust_cash(delta).map(|_| ()))
            .map(|h| h.cash())
    }

    fn get_stock_lot(&self, id: TeamId, company_id: CompanyId) -> Result<u64, CashCrashError> {
        Ok(self.holdings(id)?.stock_lot(company_id))
    }

    fn adjust_stock_lot(
        &self,
        id: TeamId,
        company_id: CompanyId,
        delta: i64,
    ) -> Result<u64, CashCrashError> {
        self.update(id, &mut |h| h.adjust_stock_lot(company_id, delta).map(|_| ()))
            .map(|h| h.stock_lot(company_id))
    }

    fn get_currency_lot(
        &self,
        id: TeamId,
        currency_id: CurrencyId,
    ) -> Result<Decimal, CashCrashError> {
        Ok(self.holdings(id)?.currency_lot(currency_id))
    }

    fn adjust_currency_lot(
        &self,
        id: TeamId,
        currency_id: CurrencyId,
        delta: Decimal,
    ) -> Result<Decimal, CashCrashError> {
        self.update(id, &mut |h| h.adjust_currency_lot(currency_id, delta).map(|_| ()))
            .map(|h| h.currency_lot(currency_id))
    }

    fn get_startup_grant(&self, id: TeamId) -> Result<Option<StartupGrant>, CashCrashError> {
        Ok(self.holdings(id)?.startup_grant().cloned())
    }

    fn clear_startup_grant(&self, id: TeamId) -> Result<Option<StartupGrant>, CashCrashError> {
        let mut cleared = None;
        self.update(id, &mut |h| {
            cleared = h.clear_startup_grant();
            Ok(())
        })?;
        Ok(cleared)
    }
}
