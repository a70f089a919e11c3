//! Overview read model.
//!
//! Replaces the observed-query pattern of a reactive UI: callers rebuild the
//! overview after each mutating operation instead of subscribing to changes.

use crate::model::debt::{Debt, DebtValidationError};
use crate::repo::debt_repo::{DebtListQuery, DebtRepository, NullsOrder, RepoResult};
use crate::summary::{upcoming, DebtSummary, UPCOMING_DEFAULT_LIMIT};

/// Snapshot rendered by the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    /// All debts, due date ascending, undated last.
    pub debts: Vec<Debt>,
    pub summary: DebtSummary,
    /// Nearest due dates, at most `UPCOMING_DEFAULT_LIMIT` entries.
    pub upcoming: Vec<Debt>,
}

impl Overview {
    /// Derives totals and upcoming selection from an ordered debt list.
    ///
    /// # Errors
    /// - `BalanceOverflow` when the totals leave the representable range.
    pub fn from_debts(debts: Vec<Debt>) -> Result<Self, DebtValidationError> {
        let summary = DebtSummary::from_debts(&debts)?;
        let upcoming = upcoming(&debts, UPCOMING_DEFAULT_LIMIT);
        Ok(Self {
            debts,
            summary,
            upcoming,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.debts.is_empty()
    }
}

/// Loads a fresh overview from storage.
pub fn load_overview<R: DebtRepository>(repo: &R) -> RepoResult<Overview> {
    let debts = repo.list_debts(&DebtListQuery {
        nulls: NullsOrder::Last,
        limit: None,
    })?;
    Ok(Overview::from_debts(debts)?)
}
