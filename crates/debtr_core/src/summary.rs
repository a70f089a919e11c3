//! Derived aggregates over a snapshot of debts.
//!
//! # Responsibility
//! - Compute portfolio totals, paid amount and payoff progress.
//! - Select the debts with the nearest due dates.
//!
//! # Invariants
//! - Every function is pure; nothing here is cached or persisted.
//! - `progress` is zero when the total starting balance is not positive, so
//!   an empty ledger never divides by zero.
//! - `progress` is not clamped: overpayment can push it above one.

use crate::model::debt::{Debt, DebtValidationError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of debts shown in the "upcoming" panel.
pub const UPCOMING_DEFAULT_LIMIT: usize = 2;

type SummaryResult<T> = Result<T, DebtValidationError>;

/// Sum of current balances.
pub fn total_current(debts: &[Debt]) -> SummaryResult<Decimal> {
    checked_sum(debts.iter().map(|debt| debt.current_balance))
}

/// Sum of starting balances.
pub fn total_starting(debts: &[Debt]) -> SummaryResult<Decimal> {
    checked_sum(debts.iter().map(|debt| debt.starting_balance))
}

/// Amount paid off across all debts.
pub fn total_paid(debts: &[Debt]) -> SummaryResult<Decimal> {
    total_starting(debts)?
        .checked_sub(total_current(debts)?)
        .ok_or(DebtValidationError::BalanceOverflow)
}

/// Paid fraction of the total starting balance.
pub fn progress(debts: &[Debt]) -> SummaryResult<Decimal> {
    progress_ratio(total_paid(debts)?, total_starting(debts)?)
}

/// Debts with a due date, earliest first, at most `limit` of them.
///
/// Equal due dates keep their input order.
pub fn upcoming(debts: &[Debt], limit: usize) -> Vec<Debt> {
    let mut dated: Vec<&Debt> = debts.iter().filter(|debt| debt.due_date.is_some()).collect();
    dated.sort_by_key(|debt| debt.due_date);
    dated.into_iter().take(limit).cloned().collect()
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> SummaryResult<Decimal> {
    values.try_fold(Decimal::ZERO, |total, value| {
        total
            .checked_add(value)
            .ok_or(DebtValidationError::BalanceOverflow)
    })
}

fn progress_ratio(paid: Decimal, starting: Decimal) -> SummaryResult<Decimal> {
    if starting <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    paid.checked_div(starting).ok_or(DebtValidationError::BalanceOverflow)
}

/// Portfolio totals shown in the overview header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub total_current: Decimal,
    pub total_starting: Decimal,
    pub total_paid: Decimal,
    pub progress: Decimal,
}

impl DebtSummary {
    /// Computes every total in one pass over `debts`.
    ///
    /// # Errors
    /// - `BalanceOverflow` when a total leaves the representable range.
    pub fn from_debts(debts: &[Debt]) -> SummaryResult<Self> {
        let (total_starting, total_current) = debts
            .iter()
            .try_fold((Decimal::ZERO, Decimal::ZERO), |(starting, current), debt| {
                Some((
                    starting.checked_add(debt.starting_balance)?,
                    current.checked_add(debt.current_balance)?,
                ))
            })
            .ok_or(DebtValidationError::BalanceOverflow)?;
        let total_paid = total_starting
            .checked_sub(total_current)
            .ok_or(DebtValidationError::BalanceOverflow)?;

        Ok(Self {
            total_current,
            total_starting,
            total_paid,
            progress: progress_ratio(total_paid, total_starting)?,
        })
    }

    /// Progress as a whole percentage, rounded half away from zero.
    pub fn progress_percent(&self) -> SummaryResult<i64> {
        self.progress
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|percent| {
                percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            })
            .and_then(|percent| percent.to_i64())
            .ok_or(DebtValidationError::BalanceOverflow)
    }

    /// Progress as a float for progress-bar widgets.
    pub fn progress_f64(&self) -> f64 {
        self.progress.to_f64().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{progress, total_paid, upcoming, DebtSummary};
    use crate::model::debt::DebtValidationError;
    use crate::model::debt::{Debt, DebtKind};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn debt(starting: i64, current: i64, due: Option<(i32, u32, u32)>) -> Debt {
        let mut debt = Debt::new(DebtKind::CreditCard, "card", Decimal::new(starting, 0));
        debt.current_balance = Decimal::new(current, 0);
        debt.due_date = due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        debt
    }

    #[test]
    fn empty_ledger_has_zero_progress() {
        let summary = DebtSummary::from_debts(&[]).unwrap();
        assert_eq!(summary.total_starting, Decimal::ZERO);
        assert_eq!(summary.progress, Decimal::ZERO);
        assert_eq!(summary.progress_percent().unwrap(), 0);
    }

    #[test]
    fn summary_matches_free_functions() {
        let debts = vec![debt(1000, 500, None), debt(3000, 2500, None)];
        let summary = DebtSummary::from_debts(&debts).unwrap();
        assert_eq!(summary.total_current, Decimal::new(3000, 0));
        assert_eq!(summary.total_starting, Decimal::new(4000, 0));
        assert_eq!(summary.total_paid, total_paid(&debts).unwrap());
        assert_eq!(summary.progress, progress(&debts).unwrap());
        assert_eq!(summary.progress, Decimal::new(25, 2));
        assert_eq!(summary.progress_percent().unwrap(), 25);
    }

    #[test]
    fn overpayment_is_not_clamped() {
        let debts = vec![debt(100, -50, None)];
        assert_eq!(progress(&debts).unwrap(), Decimal::new(15, 1));
        let summary = DebtSummary::from_debts(&debts).unwrap();
        assert_eq!(summary.progress_percent().unwrap(), 150);
    }

    #[test]
    fn non_positive_starting_total_yields_zero_progress() {
        let debts = vec![debt(0, -20, None)];
        assert_eq!(progress(&debts).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_totals_are_reported_instead_of_panicking() {
        let mut first = debt(0, 0, None);
        first.starting_balance = Decimal::MAX;
        first.current_balance = Decimal::MAX;
        let second = first.clone();
        let debts = vec![first, second];

        assert_eq!(
            DebtSummary::from_debts(&debts).unwrap_err(),
            DebtValidationError::BalanceOverflow
        );
        assert_eq!(
            progress(&debts).unwrap_err(),
            DebtValidationError::BalanceOverflow
        );
    }

    #[test]
    fn overflowing_paid_total_is_reported() {
        let mut overpaid = debt(0, -1, None);
        overpaid.starting_balance = Decimal::MAX;

        assert_eq!(
            total_paid(&[overpaid.clone()]).unwrap_err(),
            DebtValidationError::BalanceOverflow
        );
        assert_eq!(
            DebtSummary::from_debts(&[overpaid]).unwrap_err(),
            DebtValidationError::BalanceOverflow
        );
    }

    #[test]
    fn oversized_progress_percent_is_reported() {
        let summary = DebtSummary {
            progress: Decimal::MAX,
            ..DebtSummary::default()
        };
        assert_eq!(
            summary.progress_percent().unwrap_err(),
            DebtValidationError::BalanceOverflow
        );
    }

    #[test]
    fn upcoming_skips_undated_and_sorts_ascending() {
        let debts = vec![
            debt(10, 10, Some((2026, 3, 1))),
            debt(10, 10, None),
            debt(10, 10, Some((2026, 1, 15))),
            debt(10, 10, Some((2026, 2, 1))),
        ];

        let picked = upcoming(&debts, 2);
        let dates: Vec<_> = picked.iter().map(|debt| debt.due_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 1, 15),
                NaiveDate::from_ymd_opt(2026, 2, 1),
            ]
        );
    }

    #[test]
    fn upcoming_returns_fewer_when_not_enough_dated_debts() {
        let debts = vec![debt(10, 10, None), debt(10, 10, Some((2026, 5, 5)))];
        assert_eq!(upcoming(&debts, 2).len(), 1);
        assert!(upcoming(&debts, 0).is_empty());
    }
}
