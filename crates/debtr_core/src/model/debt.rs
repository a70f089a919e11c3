//! Debt domain model.
//!
//! # Responsibility
//! - Define the tracked obligation record and its kind.
//! - Provide checked balance arithmetic used by payment bookkeeping.
//!
//! # Invariants
//! - `uuid` is stable and never nil.
//! - `name` is non-empty after trimming.
//! - `starting_balance` is fixed at creation; only `current_balance` moves.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a tracked debt.
pub type DebtId = Uuid;

/// Category of a tracked debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    CreditCard,
    PersonalLoan,
    LineOfCredit,
    PersonalDebt,
}

impl DebtKind {
    /// All kinds in picker order.
    pub const ALL: [DebtKind; 4] = [
        DebtKind::CreditCard,
        DebtKind::PersonalLoan,
        DebtKind::LineOfCredit,
        DebtKind::PersonalDebt,
    ];

    /// Stable machine code, shared by storage and FFI.
    pub fn code(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::PersonalLoan => "personal_loan",
            Self::LineOfCredit => "line_of_credit",
            Self::PersonalDebt => "personal_debt",
        }
    }

    /// Parses a machine code produced by [`DebtKind::code`].
    pub fn from_code(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == value)
    }

    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::PersonalLoan => "Personal Loan",
            Self::LineOfCredit => "Line of Credit",
            Self::PersonalDebt => "Personal Debt",
        }
    }
}

/// Field-level validation errors for debts and payments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebtValidationError {
    /// Record id is the nil UUID.
    NilId,
    /// Debt name is empty or whitespace only.
    EmptyName,
    /// Payment amount is zero or negative.
    NonPositiveAmount(Decimal),
    /// Balance adjustment left the representable decimal range.
    BalanceOverflow,
}

impl Display for DebtValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be the nil uuid"),
            Self::EmptyName => write!(f, "debt name must not be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "payment amount must be positive, got {amount}")
            }
            Self::BalanceOverflow => write!(f, "balance adjustment overflowed"),
        }
    }
}

impl Error for DebtValidationError {}

/// Canonical record for one tracked debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DebtRecord")]
pub struct Debt {
    pub uuid: DebtId,
    #[serde(rename = "type")]
    pub kind: DebtKind,
    pub name: String,
    /// Balance when tracking began. Never rewritten after creation.
    pub starting_balance: Decimal,
    /// Outstanding balance, moved by payment bookkeeping or explicit edits.
    pub current_balance: Decimal,
    /// Annual percentage rate, e.g. `19.99`.
    pub apr: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct DebtRecord {
    uuid: DebtId,
    #[serde(rename = "type")]
    kind: DebtKind,
    name: String,
    starting_balance: Decimal,
    current_balance: Decimal,
    apr: Option<Decimal>,
    due_date: Option<NaiveDate>,
}

impl TryFrom<DebtRecord> for Debt {
    type Error = DebtValidationError;

    fn try_from(record: DebtRecord) -> Result<Self, Self::Error> {
        let debt = Self {
            uuid: record.uuid,
            kind: record.kind,
            name: record.name,
            starting_balance: record.starting_balance,
            current_balance: record.current_balance,
            apr: record.apr,
            due_date: record.due_date,
        };
        debt.validate()?;
        Ok(debt)
    }
}

impl Debt {
    /// Creates a debt with a generated id whose current balance equals the
    /// starting balance.
    pub fn new(kind: DebtKind, name: impl Into<String>, starting_balance: Decimal) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            name: name.into(),
            starting_balance,
            current_balance: starting_balance,
            apr: None,
            due_date: None,
        }
    }

    /// Creates a debt with a caller-provided id.
    ///
    /// # Errors
    /// - `NilId` when `uuid` is nil.
    pub fn with_id(
        uuid: DebtId,
        kind: DebtKind,
        name: impl Into<String>,
        starting_balance: Decimal,
    ) -> Result<Self, DebtValidationError> {
        if uuid.is_nil() {
            return Err(DebtValidationError::NilId);
        }
        let mut debt = Self::new(kind, name, starting_balance);
        debt.uuid = uuid;
        Ok(debt)
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), DebtValidationError> {
        if self.uuid.is_nil() {
            return Err(DebtValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(DebtValidationError::EmptyName);
        }
        Ok(())
    }

    /// Amount already paid off relative to the starting balance.
    pub fn paid_amount(&self) -> Result<Decimal, DebtValidationError> {
        self.starting_balance
            .checked_sub(self.current_balance)
            .ok_or(DebtValidationError::BalanceOverflow)
    }

    /// Whether nothing remains outstanding. Overpaid debts count as paid off.
    pub fn is_paid_off(&self) -> bool {
        self.current_balance <= Decimal::ZERO
    }

    /// Reduces the current balance by a payment amount.
    ///
    /// The balance may go negative: overpayment is allowed.
    pub fn debit(&mut self, amount: Decimal) -> Result<Decimal, DebtValidationError> {
        self.current_balance = self
            .current_balance
            .checked_sub(amount)
            .ok_or(DebtValidationError::BalanceOverflow)?;
        Ok(self.current_balance)
    }

    /// Restores a payment amount to the current balance.
    pub fn credit(&mut self, amount: Decimal) -> Result<Decimal, DebtValidationError> {
        self.current_balance = self
            .current_balance
            .checked_add(amount)
            .ok_or(DebtValidationError::BalanceOverflow)?;
        Ok(self.current_balance)
    }
}
