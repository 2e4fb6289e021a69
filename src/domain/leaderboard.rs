//! Team ranking by total portfolio value.

use rust_decimal::Decimal;
use serde::Serialize;

use super::team::TeamId;
use super::valuation::PortfolioSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub team_id: TeamId,
    pub team_name: String,
    pub cash: Decimal,
    pub total_stock_value: Decimal,
    pub total_currency_value: Decimal,
    pub startup_value: Decimal,
    pub total_portfolio_value: Decimal,
}

/// Highest total first; equal totals share a rank and are ordered by team id.
pub fn rank(mut snapshots: Vec<PortfolioSnapshot>) -> Vec<LeaderboardEntry> {
    snapshots.sort_by(|a, b| {
        b.total_portfolio_value
            .cmp(&a.total_portfolio_value)
            .then(a.team.id.cmp(&b.team.id))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(snapshots.len());
    for (i, snap) in snapshots.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(prev) if prev.total_portfolio_value == snap.total_portfolio_value => prev.rank,
            _ => i + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            team_id: snap.team.id,
            team_name: snap.team.name,
            cash: snap.cash,
            total_stock_value: snap.total_stock_value,
            total_currency_value: snap.total_currency_value,
            startup_value: snap.startup_value,
            total_portfolio_value: snap.total_portfolio_value,
        });
    }
    entries
}
