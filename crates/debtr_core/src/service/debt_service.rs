//! Debt use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list/delete entry points for debts.
//! - Reject blank names before any storage access.
//!
//! # Invariants
//! - Names are trimmed before persistence.
//! - A new debt's current balance defaults to its starting balance.
//! - Deleting a debt removes its payments through the store cascade.

use crate::model::debt::{Debt, DebtId, DebtKind, DebtValidationError};
use crate::repo::debt_repo::{DebtListQuery, DebtRepository, NullsOrder, RepoError, RepoResult};
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for debt use-cases.
#[derive(Debug)]
pub enum DebtServiceError {
    /// Name is empty after trimming.
    InvalidName,
    /// Target debt does not exist.
    DebtNotFound(DebtId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for DebtServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "debt name must not be empty"),
            Self::DebtNotFound(id) => write!(f, "debt not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DebtServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DebtServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DebtNotFound(id) => Self::DebtNotFound(id),
            RepoError::Validation(DebtValidationError::EmptyName) => Self::InvalidName,
            other => Self::Repo(other),
        }
    }
}

/// Request model for creating a debt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDebtRequest {
    pub kind: DebtKind,
    pub name: String,
    pub starting_balance: Decimal,
    /// Defaults to `starting_balance` when `None`.
    pub current_balance: Option<Decimal>,
    pub apr: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

/// Debt service facade over repository implementations.
pub struct DebtService<R: DebtRepository> {
    repo: R,
}

impl<R: DebtRepository> DebtService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one debt and returns the stored record.
    pub fn create_debt(&self, request: &NewDebtRequest) -> Result<Debt, DebtServiceError> {
        let name = normalize_name(&request.name)?;
        let mut debt = Debt::new(request.kind, name, request.starting_balance);
        if let Some(current) = request.current_balance {
            debt.current_balance = current;
        }
        debt.apr = request.apr;
        debt.due_date = request.due_date;

        let debt_id = self.repo.create_debt(&debt)?;
        info!(
            "event=debt_create module=debt status=ok debt_id={} kind={} has_due_date={}",
            debt_id,
            debt.kind.code(),
            debt.due_date.is_some()
        );
        self.read_back(debt_id)
    }

    /// Rewrites the mutable fields of an existing debt.
    ///
    /// `starting_balance` in `debt` is ignored; the stored value is kept.
    pub fn update_debt(&self, debt: &Debt) -> Result<Debt, DebtServiceError> {
        let mut normalized = debt.clone();
        normalized.name = normalize_name(&debt.name)?;

        self.repo.update_debt(&normalized)?;
        info!(
            "event=debt_update module=debt status=ok debt_id={}",
            normalized.uuid
        );
        self.read_back(normalized.uuid)
    }

    /// Gets one debt by stable ID.
    pub fn get_debt(&self, id: DebtId) -> RepoResult<Option<Debt>> {
        self.repo.get_debt(id)
    }

    /// Lists all debts ordered by due date ascending.
    pub fn list_debts(&self, nulls: NullsOrder) -> RepoResult<Vec<Debt>> {
        self.repo.list_debts(&DebtListQuery { nulls, limit: None })
    }

    /// Deletes one debt together with its payments.
    ///
    /// Returns the number of payments removed by the cascade.
    pub fn delete_debt(&self, id: DebtId) -> Result<usize, DebtServiceError> {
        let removed_payments = self.repo.delete_debt(id)?;
        info!(
            "event=debt_delete module=debt status=ok debt_id={} cascaded_payments={}",
            id, removed_payments
        );
        Ok(removed_payments)
    }

    fn read_back(&self, id: DebtId) -> Result<Debt, DebtServiceError> {
        self.repo
            .get_debt(id)?
            .ok_or(DebtServiceError::DebtNotFound(id))
    }
}

fn normalize_name(name: &str) -> Result<String, DebtServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DebtServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
