//! Domain model for tracked debts and the payments recorded against them.
//!
//! # Responsibility
//! - Define canonical data structures used by core bookkeeping logic.
//! - Own field-level validation shared by repositories and services.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - A payment references its owning debt by id, never by live pointer.
//! - Payment amounts are strictly positive.

pub mod debt;
pub mod payment;
