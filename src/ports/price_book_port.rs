//! Price book access port.

use rust_decimal::Decimal;

use crate::domain::error::CashCrashError;
use crate::domain::instrument::{
    Company, CompanyEdit, CompanyId, Currency, CurrencyEdit, CurrencyId, NewCompany, NewCurrency,
    QuoteUpdate,
};
use crate::domain::price_book::PriceBook;

/// Shared price book. Implementations provide a consistent read snapshot, a
/// guarded read and a serialized write; everything else is derived from those.
///
/// `read` and `write` may call into the holdings port from `f`, so holdings
/// implementations must never wait on the price book while a team is locked.
pub trait PriceBookPort {
    /// Copy of the whole book as of now.
    fn snapshot(&self) -> Result<PriceBook, CashCrashError>;

    /// Runs `f` against the live book. No write lands until `f` returns.
    fn read(
        &self,
        f: &mut dyn FnMut(&PriceBook) -> Result<(), CashCrashError>,
    ) -> Result<(), CashCrashError>;

    /// Runs `f` against the book. A failed `f` must leave the book unchanged.
    fn write(
        &self,
        f: &mut dyn FnMut(&mut PriceBook) -> Result<(), CashCrashError>,
    ) -> Result<(), CashCrashError>;

    fn get_company(&self, id: CompanyId) -> Result<Company, CashCrashError> {
        self.snapshot()?.get_company(id).cloned()
    }

    fn get_currency(&self, id: CurrencyId) -> Result<Currency, CashCrashError> {
        self.snapshot()?.get_currency(id).cloned()
    }

    fn list_companies(&self) -> Result<Vec<Company>, CashCrashError> {
        Ok(self.snapshot()?.companies().cloned().collect())
    }

    fn list_currencies(&self) -> Result<Vec<Currency>, CashCrashError> {
        Ok(self.snapshot()?.currencies().cloned().collect())
    }

    fn add_company(&self, new: NewCompany) -> Result<Company, CashCrashError> {
        write_returning(self, |book| book.add_company(new.clone()))
    }

    fn add_currency(&self, new: NewCurrency) -> Result<Currency, CashCrashError> {
        write_returning(self, |book| book.add_currency(new.clone()))
    }

    fn update_company(&self, id: CompanyId, edit: CompanyEdit) -> Result<Company, CashCrashError> {
        write_returning(self, |book| book.update_company(id, edit.clone()))
    }

    fn update_currency(
        &self,
        id: CurrencyId,
        edit: CurrencyEdit,
    ) -> Result<Currency, CashCrashError> {
        write_returning(self, |book| book.update_currency(id, edit.clone()))
    }

    /// `sell` defaults to the book's spread below `buy`.
    fn set_company_price(
        &self,
        id: CompanyId,
        buy: Decimal,
        sell: Option<Decimal>,
    ) -> Result<Company, CashCrashError> {
        write_returning(self, |book| book.set_company_price(id, buy, sell))
    }

    fn set_currency_rate(
        &self,
        id: CurrencyId,
        buy: Decimal,
        sell: Option<Decimal>,
    ) -> Result<Currency, CashCrashError> {
        write_returning(self, |book| book.set_currency_rate(id, buy, sell))
    }

    fn set_company_prices(&self, updates: &[QuoteUpdate]) -> Result<Vec<Company>, CashCrashError> {
        write_returning(self, |book| book.set_company_prices(updates))
    }

    fn set_currency_rates(
        &self,
        updates: &[QuoteUpdate],
    ) -> Result<Vec<Currency>, CashCrashError> {
        write_returning(self, |book| book.set_currency_rates(updates))
    }

    fn remove_company(&self, id: CompanyId) -> Result<Company, CashCrashError> {
        write_returning(self, |book| book.remove_company(id))
    }

    fn remove_currency(&self, id: CurrencyId) -> Result<Currency, CashCrashError> {
        write_returning(self, |book| book.remove_currency(id))
    }
}

fn write_returning<P, T, F>(port: &P, mut f: F) -> Result<T, CashCrashError>
where
    P: PriceBookPort + ?Sized,
    F: FnMut(&mut PriceBook) -> Result<T, CashCrashError>,
{
    let mut out = None;
    port.write(&mut |book| {
        out = Some(f(book)?);
        Ok(())
    })?;
    out.ok_or_else(|| CashCrashError::Internal {
        reason: "price book write produced no result".into(),
    })
}
