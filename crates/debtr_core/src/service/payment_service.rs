//! Payment use-case service (balance bookkeeping).
//!
//! # Responsibility
//! - Record, amend and delete payments from the debt detail view and the
//!   standalone "record payment" flow.
//! - Report drift between a debt's balance and its payment history.
//!
//! # Invariants
//! - `amount <= 0` and missing targets are rejected before storage access.
//! - Each payment write and its balance adjustment commit together; there is
//!   no recompute-from-history path that rewrites balances.

use crate::model::debt::{DebtId, DebtValidationError};
use crate::model::payment::{validate_amount, Payment, PaymentId};
use crate::repo::debt_repo::{RepoError, RepoResult};
use crate::repo::payment_repo::{PaymentRepository, RemovedPayment};
use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for payment use-cases.
#[derive(Debug)]
pub enum PaymentServiceError {
    /// Amount is zero or negative.
    NonPositiveAmount(Decimal),
    /// Standalone flow submitted without choosing a debt.
    NoTargetSelected,
    DebtNotFound(DebtId),
    PaymentNotFound(PaymentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for PaymentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "payment amount must be positive, got {amount}")
            }
            Self::NoTargetSelected => write!(f, "no debt selected for payment"),
            Self::DebtNotFound(id) => write!(f, "debt not found: {id}"),
            Self::PaymentNotFound(id) => write!(f, "payment not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PaymentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PaymentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DebtNotFound(id) => Self::DebtNotFound(id),
            RepoError::PaymentNotFound(id) => Self::PaymentNotFound(id),
            RepoError::Validation(DebtValidationError::NonPositiveAmount(amount)) => {
                Self::NonPositiveAmount(amount)
            }
            other => Self::Repo(other),
        }
    }
}

/// Input of the standalone "record payment" flow, where the user picks the
/// target debt from a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaymentRequest {
    /// `None` while nothing is chosen in the picker.
    pub debt_id: Option<DebtId>,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    pub note: String,
}

/// A stored payment together with the owning debt's resulting balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub balance_after: Decimal,
}

/// Comparison of a debt's balance with its payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAudit {
    pub debt_id: DebtId,
    pub starting_balance: Decimal,
    pub current_balance: Decimal,
    pub payment_total: Decimal,
    /// `starting_balance - payment_total`.
    pub expected_balance: Decimal,
    /// `current_balance - expected_balance`; zero when no out-of-band edit
    /// touched the balance.
    pub drift: Decimal,
}

impl BalanceAudit {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}

/// Payment service facade over repository implementations.
pub struct PaymentService<R: PaymentRepository> {
    repo: R,
}

impl<R: PaymentRepository> PaymentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Records a payment against `debt_id` and debits its balance.
    pub fn record_payment(
        &self,
        debt_id: DebtId,
        amount: Decimal,
        paid_on: NaiveDate,
        note: impl Into<String>,
    ) -> Result<PaymentReceipt, PaymentServiceError> {
        ensure_positive(amount)?;
        let started_at = Instant::now();

        let payment = Payment::new(debt_id, amount, paid_on, note);
        let balance_after = self.repo.record_payment(&payment)?;
        info!(
            "event=payment_record module=payment status=ok debt_id={} payment_id={} duration_ms={}",
            debt_id,
            payment.uuid,
            started_at.elapsed().as_millis()
        );

        Ok(PaymentReceipt {
            payment,
            balance_after,
        })
    }

    /// Records a payment from the standalone flow.
    ///
    /// # Errors
    /// - `NoTargetSelected` when `request.debt_id` is `None`.
    /// - Otherwise the same as [`PaymentService::record_payment`].
    pub fn record_payment_for(
        &self,
        request: &RecordPaymentRequest,
    ) -> Result<PaymentReceipt, PaymentServiceError> {
        let debt_id = request
            .debt_id
            .ok_or(PaymentServiceError::NoTargetSelected)?;
        self.record_payment(
            debt_id,
            request.amount,
            request.paid_on,
            request.note.clone(),
        )
    }

    /// Amends amount, date and note of an existing payment.
    ///
    /// The owning debt's balance moves by the difference between the old and
    /// the new amount.
    pub fn update_payment(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        paid_on: NaiveDate,
        note: impl Into<String>,
    ) -> Result<PaymentReceipt, PaymentServiceError> {
        ensure_positive(amount)?;

        let mut payment = self
            .repo
            .get_payment(payment_id)?
            .ok_or(PaymentServiceError::PaymentNotFound(payment_id))?;
        payment.amount = amount;
        payment.paid_on = paid_on;
        payment.note = note.into();

        let balance_after = self.repo.update_payment(&payment)?;
        info!(
            "event=payment_update module=payment status=ok debt_id={} payment_id={}",
            payment.debt_id, payment_id
        );

        Ok(PaymentReceipt {
            payment,
            balance_after,
        })
    }

    /// Deletes a payment and restores its amount to the owning debt.
    pub fn delete_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<RemovedPayment, PaymentServiceError> {
        let removed = self.repo.delete_payment(payment_id)?;
        info!(
            "event=payment_delete module=payment status=ok debt_id={} payment_id={}",
            removed.payment.debt_id, payment_id
        );
        Ok(removed)
    }

    /// Payment history of one debt, newest first.
    pub fn list_payments(&self, debt_id: DebtId) -> Result<Vec<Payment>, PaymentServiceError> {
        self.require_debt_exists(debt_id)?;
        Ok(self.repo.list_payments(debt_id)?)
    }

    /// Gets one payment by stable ID.
    pub fn get_payment(&self, payment_id: PaymentId) -> RepoResult<Option<Payment>> {
        self.repo.get_payment(payment_id)
    }

    /// Compares the stored balance with `starting - sum(payments)`.
    ///
    /// Read-only: a non-zero drift is reported, never corrected.
    pub fn audit_balance(&self, debt_id: DebtId) -> Result<BalanceAudit, PaymentServiceError> {
        let debt = self
            .repo
            .get_owner(debt_id)?
            .ok_or(PaymentServiceError::DebtNotFound(debt_id))?;
        let payment_total = self.repo.payment_total(debt_id)?;
        let expected_balance = debt
            .starting_balance
            .checked_sub(payment_total)
            .ok_or(RepoError::Validation(DebtValidationError::BalanceOverflow))?;
        let drift = debt
            .current_balance
            .checked_sub(expected_balance)
            .ok_or(RepoError::Validation(DebtValidationError::BalanceOverflow))?;

        if !drift.is_zero() {
            warn!(
                "event=balance_audit module=payment status=drift debt_id={}",
                debt_id
            );
        }

        Ok(BalanceAudit {
            debt_id,
            starting_balance: debt.starting_balance,
            current_balance: debt.current_balance,
            payment_total,
            expected_balance,
            drift,
        })
    }

    fn require_debt_exists(&self, debt_id: DebtId) -> Result<(), PaymentServiceError> {
        if self.repo.get_owner(debt_id)?.is_none() {
            return Err(PaymentServiceError::DebtNotFound(debt_id));
        }
        Ok(())
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), PaymentServiceError> {
    validate_amount(amount).map_err(|_| PaymentServiceError::NonPositiveAmount(amount))
}
