//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce model `validate()` before persistence.
//! - Every payment mutation and its balance adjustment share one transaction.
//! - Repository APIs return semantic errors (`DebtNotFound`,
//!   `PaymentNotFound`) in addition to DB transport errors.

pub mod debt_repo;
pub mod payment_repo;
pub mod preferences_repo;
mod sql_support;
