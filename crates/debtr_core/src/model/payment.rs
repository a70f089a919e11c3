//! Payment domain model.
//!
//! # Responsibility
//! - Define one recorded reduction of a debt's current balance.
//!
//! # Invariants
//! - `uuid` is stable and never nil.
//! - `amount` is strictly positive.
//! - `debt_id` names the owning debt; ownership never changes after creation.

use crate::model::debt::{DebtId, DebtValidationError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a recorded payment.
pub type PaymentId = Uuid;

/// One payment applied to a specific debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PaymentRecord")]
pub struct Payment {
    pub uuid: PaymentId,
    pub debt_id: DebtId,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    /// Free-text note; empty when the user left none.
    pub note: String,
}

#[derive(Deserialize)]
struct PaymentRecord {
    uuid: PaymentId,
    debt_id: DebtId,
    amount: Decimal,
    paid_on: NaiveDate,
    #[serde(default)]
    note: String,
}

impl TryFrom<PaymentRecord> for Payment {
    type Error = DebtValidationError;

    fn try_from(record: PaymentRecord) -> Result<Self, Self::Error> {
        let payment = Self {
            uuid: record.uuid,
            debt_id: record.debt_id,
            amount: record.amount,
            paid_on: record.paid_on,
            note: record.note,
        };
        payment.validate()?;
        Ok(payment)
    }
}

impl Payment {
    /// Creates a payment for `debt_id` with a generated id.
    ///
    /// Does not validate; persistence paths call [`Payment::validate`].
    pub fn new(
        debt_id: DebtId,
        amount: Decimal,
        paid_on: NaiveDate,
        note: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            debt_id,
            amount,
            paid_on,
            note: note.into(),
        }
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), DebtValidationError> {
        if self.uuid.is_nil() || self.debt_id.is_nil() {
            return Err(DebtValidationError::NilId);
        }
        validate_amount(self.amount)
    }
}

/// Rejects zero and negative payment amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), DebtValidationError> {
    if amount <= Decimal::ZERO {
        return Err(DebtValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}
