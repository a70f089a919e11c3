//! Core domain logic for Debtr, a personal debt tracker.
//! This crate is the single source of truth for balance bookkeeping invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod summary;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::debt::{Debt, DebtId, DebtKind, DebtValidationError};
pub use model::payment::{Payment, PaymentId};
pub use repo::debt_repo::{
    DebtListQuery, DebtRepository, NullsOrder, RepoError, RepoResult, SqliteDebtRepository,
};
pub use repo::payment_repo::{PaymentRepository, RemovedPayment, SqlitePaymentRepository};
pub use repo::preferences_repo::{PreferencesRepository, SqlitePreferencesRepository};
pub use service::debt_service::{DebtService, DebtServiceError, NewDebtRequest};
pub use service::overview_service::{load_overview, Overview};
pub use service::payment_service::{
    BalanceAudit, PaymentReceipt, PaymentService, PaymentServiceError, RecordPaymentRequest,
};
pub use settings::{Currency, Preferences, ThemePreference};
pub use summary::{DebtSummary, UPCOMING_DEFAULT_LIMIT};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
