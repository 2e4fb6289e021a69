//! Process-memory implementation of the price book and holdings ports.
//!
//! Built once at startup and shared behind `Arc`. The team registry sits
//! behind one `RwLock`; each team's holdings have their own `Mutex`, so
//! orders for one team are serialized while different teams never contend.
//! Lock order is price book, then registry, then books, then any team mutex.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::error::CashCrashError;
use crate::domain::holdings::TeamHoldings;
use crate::domain::price_book::PriceBook;
use crate::domain::team::{
    NewStartupGrant, StartupGrant, Team, TeamId, validate_access_code, validate_team_fields,
};
use crate::ports::holdings_port::HoldingsPort;
use crate::ports::price_book_port::PriceBookPort;

pub struct MemoryStore {
    prices: RwLock<PriceBook>,
    registry: RwLock<BTreeMap<TeamId, Team>>,
    books: RwLock<BTreeMap<TeamId, Arc<Mutex<TeamHoldings>>>>,
    next_team_id: AtomicU64,
    next_grant_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(PriceBook::default())
    }
}

impl MemoryStore {
    pub fn new(prices: PriceBook) -> Self {
        MemoryStore {
            prices: RwLock::new(prices),
            registry: RwLock::new(BTreeMap::new()),
            books: RwLock::new(BTreeMap::new()),
            next_team_id: AtomicU64::new(1),
            next_grant_id: AtomicU64::new(1),
        }
    }

    fn book(&self, id: TeamId) -> Result<Arc<Mutex<TeamHoldings>>, CashCrashError> {
        self.books
            .read()
            .map_err(|_| CashCrashError::poisoned("holdings index"))?
            .get(&id)
            .cloned()
            .ok_or(CashCrashError::TeamNotFound { id })
    }

    fn code_taken(
        registry: &BTreeMap<TeamId, Team>,
        access_code: &str,
        except: Option<TeamId>,
    ) -> bool {
        registry
            .values()
            .any(|t| t.access_code == access_code && Some(t.id) != except)
    }
}

impl PriceBookPort for MemoryStore {
    fn snapshot(&self) -> Result<PriceBook, CashCrashError> {
        self.prices
            .read()
            .map(|book| book.clone())
            .map_err(|_| CashCrashError::poisoned("price book"))
    }

    fn read(
        &self,
        f: &mut dyn FnMut(&PriceBook) -> Result<(), CashCrashError>,
    ) -> Result<(), CashCrashError> {
        let book = self
            .prices
            .read()
            .map_err(|_| CashCrashError::poisoned("price book"))?;
        f(&book)
    }

    fn write(
        &self,
        f: &mut dyn FnMut(&mut PriceBook) -> Result<(), CashCrashError>,
    ) -> Result<(), CashCrashError> {
        let mut book = self
            .prices
            .write()
            .map_err(|_| CashCrashError::poisoned("price book"))?;
        let mut staged = book.clone();
        f(&mut staged)?;
        *book = staged;
        Ok(())
    }
}

impl HoldingsPort for MemoryStore {
    fn create_team(
        &self,
        name: &str,
        access_code: &str,
        cash: Decimal,
    ) -> Result<Team, CashCrashError> {
        validate_team_fields(name, access_code)?;
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CashCrashError::poisoned("team registry"))?;
        if Self::code_taken(&registry, access_code, None) {
            return Err(CashCrashError::AccessCodeTaken);
        }
        let id = self.next_team_id.fetch_add(1, Ordering::SeqCst);
        let holdings = TeamHoldings::new(id, cash)?;
        let team = Team {
            id,
            name: name.trim().to_string(),
            access_code: access_code.to_string(),
        };
        self.books
            .write()
            .map_err(|_| CashCrashError::poisoned("holdings index"))?
            .insert(id, Arc::new(Mutex::new(holdings)));
        registry.insert(id, team.clone());
        Ok(team)
    }

    fn team(&self, id: TeamId) -> Result<Team, CashCrashError> {
        self.registry
            .read()
            .map_err(|_| CashCrashError::poisoned("team registry"))?
            .get(&id)
            .cloned()
            .ok_or(CashCrashError::TeamNotFound { id })
    }

    fn teams(&self) -> Result<Vec<Team>, CashCrashError> {
        Ok(self
            .registry
            .read()
            .map_err(|_| CashCrashError::poisoned("team registry"))?
            .values()
            .cloned()
            .collect())
    }

    fn team_by_access_code(&self, access_code: &str) -> Result<Option<Team>, CashCrashError> {
        Ok(self
            .registry
            .read()
            .map_err(|_| CashCrashError::poisoned("team registry"))?
            .values()
            .find(|t| t.access_code == access_code)
            .cloned())
    }

    fn set_access_code(&self, id: TeamId, access_code: &str) -> Result<Team, CashCrashError> {
        validate_access_code(access_code)?;
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CashCrashError::poisoned("team registry"))?;
        if Self::code_taken(&registry, access_code, Some(id)) {
            return Err(CashCrashError::AccessCodeTaken);
        }
        let team = registry
            .get_mut(&id)
            .ok_or(CashCrashError::TeamNotFound { id })?;
        team.access_code = access_code.to_string();
        Ok(team.clone())
    }

    fn rename_team(&self, id: TeamId, name: &str) -> Result<Team, CashCrashError> {
        if name.trim().is_empty() {
            return Err(CashCrashError::InvalidInput {
                reason: "team name must not be empty".into(),
            });
        }
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CashCrashError::poisoned("team registry"))?;
        let team = registry
            .get_mut(&id)
            .ok_or(CashCrashError::TeamNotFound { id })?;
        team.name = name.trim().to_string();
        Ok(team.clone())
    }

    fn remove_team(&self, id: TeamId) -> Result<Team, CashCrashError> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| CashCrashError::poisoned("team registry"))?;
        let team = registry
            .remove(&id)
            .ok_or(CashCrashError::TeamNotFound { id })?;
        self.books
            .write()
            .map_err(|_| CashCrashError::poisoned("holdings index"))?
            .remove(&id);
        Ok(team)
    }

    fn holdings(&self, id: TeamId) -> Result<TeamHoldings, CashCrashError> {
        let book = self.book(id)?;
        let holdings = book
            .lock()
            .map_err(|_| CashCrashError::poisoned("team holdings"))?;
        Ok(holdings.clone())
    }

    fn update(
        &self,
        id: TeamId,
        f: &mut dyn FnMut(&mut TeamHoldings) -> Result<(), CashCrashError>,
    ) -> Result<TeamHoldings, CashCrashError> {
        let book = self.book(id)?;
        let mut holdings = book
            .lock()
            .map_err(|_| CashCrashError::poisoned("team holdings"))?;
        let mut working = holdings.clone();
        f(&mut working)?;
        *holdings = working;
        Ok(holdings.clone())
    }

    fn set_startup_grant(
        &self,
        id: TeamId,
        grant: NewStartupGrant,
    ) -> Result<StartupGrant, CashCrashError> {
        grant.validate()?;
        let grant = StartupGrant {
            id: self.next_grant_id.fetch_add(1, Ordering::SeqCst),
            team_id: id,
            name: grant.name,
            description: grant.description,
            value: grant.value,
            industry: grant.industry,
            risk_level: grant.risk_level,
        };
        self.update(id, &mut |h| {
            h.set_startup_grant(grant.clone());
            Ok(())
        })?;
        Ok(grant)
    }
}
