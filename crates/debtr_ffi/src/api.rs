//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Convert boundary strings into typed domain values and back.
//! - Return a refreshed overview after every mutation so the UI never keeps
//!   a stale read model.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Decimals cross the boundary as canonical decimal strings, dates as
//!   `YYYY-MM-DD`, ids as hyphenated UUID strings.
//! - Each call opens its own connection; no state is shared between calls
//!   except the resolved database path.

use chrono::NaiveDate;
use debtr_core::db::open_db;
use debtr_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_overview,
    ping as ping_inner, BalanceAudit, Currency, Debt, DebtKind, DebtService, DebtServiceError,
    NewDebtRequest, Overview, Payment, PaymentService, PaymentServiceError, Preferences,
    PreferencesRepository, RecordPaymentRequest, SqliteDebtRepository, SqlitePaymentRepository,
    SqlitePreferencesRepository, ThemePreference,
};
use log::warn;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

const DB_FILE_NAME: &str = "debtr.sqlite3";
const DB_PATH_ENV: &str = "DEBTR_DB_PATH";
const DATE_FORMAT: &str = "%Y-%m-%d";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One debt as rendered by list and detail screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtItem {
    pub id: String,
    /// Machine code (`credit_card|personal_loan|line_of_credit|personal_debt`).
    pub kind: String,
    pub kind_label: String,
    pub name: String,
    pub starting_balance: String,
    pub current_balance: String,
    /// `starting_balance - current_balance`.
    pub paid_amount: String,
    pub apr: Option<String>,
    pub due_date: Option<String>,
}

/// Portfolio totals for the summary card.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryItem {
    pub total_current: String,
    pub total_starting: String,
    pub total_paid: String,
    /// Unclamped ratio; exceeds `1.0` on overpayment.
    pub progress: f64,
    pub progress_percent: i64,
}

/// Main-screen read model.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewResponse {
    pub ok: bool,
    pub message: String,
    /// All debts, due date ascending, undated last.
    pub debts: Vec<DebtItem>,
    /// Nearest due dates (at most two).
    pub upcoming: Vec<DebtItem>,
    pub summary: SummaryItem,
}

impl OverviewResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            debts: Vec::new(),
            upcoming: Vec::new(),
            summary: SummaryItem {
                total_current: Decimal::ZERO.to_string(),
                total_starting: Decimal::ZERO.to_string(),
                total_paid: Decimal::ZERO.to_string(),
                progress: 0.0,
                progress_percent: 0,
            },
        }
    }
}

/// Generic action response envelope for mutating calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Id of the debt or payment the action touched.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Refreshed read model; `None` on failure or when the refresh after a
    /// committed write failed.
    pub overview: Option<OverviewResponse>,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: String, overview: OverviewResponse) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
            overview: Some(overview),
        }
    }

    fn committed_without_overview(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
            overview: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
            overview: None,
        }
    }
}

/// One row of a debt's payment history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentItem {
    pub id: String,
    pub debt_id: String,
    pub amount: String,
    pub paid_on: String,
    pub note: String,
}

/// Payment history envelope, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentListResponse {
    pub ok: bool,
    pub message: String,
    pub items: Vec<PaymentItem>,
}

/// Balance versus payment-history comparison for one debt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAuditResponse {
    pub ok: bool,
    pub message: String,
    pub starting_balance: Option<String>,
    pub current_balance: Option<String>,
    pub payment_total: Option<String>,
    pub expected_balance: Option<String>,
    pub drift: Option<String>,
    pub consistent: bool,
}

/// Preference envelope for the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesResponse {
    pub ok: bool,
    pub message: String,
    pub currency_code: String,
    pub use_system_theme: bool,
    pub dark_mode: bool,
}

impl PreferencesResponse {
    fn from_preferences(preferences: Preferences, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            currency_code: preferences.currency.code().to_string(),
            use_system_theme: preferences.theme.use_system_theme,
            dark_mode: preferences.theme.dark_mode,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        let mut response = Self::from_preferences(Preferences::default(), message);
        response.ok = false;
        response
    }
}

/// Debt kind option for the create/edit picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtKindItem {
    pub code: String,
    pub label: String,
}

/// Loads the main-screen overview.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; `ok=false` with empty lists on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn overview() -> OverviewResponse {
    match with_connection(load_overview_response) {
        Ok(response) => response,
        Err(err) => OverviewResponse::failure(format!("overview failed: {err}")),
    }
}

/// Creates a debt.
///
/// Input semantics:
/// - `kind`: machine code from [`debt_kinds`].
/// - `current_balance`: `None` or blank uses `starting_balance`.
/// - `apr`, `due_date`: `None` or blank means unset.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_create(
    kind: String,
    name: String,
    starting_balance: String,
    current_balance: Option<String>,
    apr: Option<String>,
    due_date: Option<String>,
) -> ActionResponse {
    run_action("debt_create", |conn| {
        let request = NewDebtRequest {
            kind: parse_kind(&kind)?,
            name,
            starting_balance: parse_decimal("starting_balance", &starting_balance)?,
            current_balance: parse_optional_decimal("current_balance", current_balance)?,
            apr: parse_optional_decimal("apr", apr)?,
            due_date: parse_optional_date("due_date", due_date)?,
        };
        let debt = with_debt_service(conn, |service| service.create_debt(&request))?;
        Ok((debt.uuid, "Debt created.".to_string()))
    })
}

/// Rewrites the editable fields of a debt.
///
/// The starting balance is fixed at creation and cannot be edited.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_update(
    debt_id: String,
    kind: String,
    name: String,
    current_balance: String,
    apr: Option<String>,
    due_date: Option<String>,
) -> ActionResponse {
    run_action("debt_update", |conn| {
        let id = parse_uuid("debt_id", &debt_id)?;
        let kind = parse_kind(&kind)?;
        let current_balance = parse_decimal("current_balance", &current_balance)?;
        let apr = parse_optional_decimal("apr", apr)?;
        let due_date = parse_optional_date("due_date", due_date)?;

        let debt = with_debt_service(conn, |service| {
            let mut debt = service
                .get_debt(id)?
                .ok_or(DebtServiceError::DebtNotFound(id))?;
            debt.kind = kind;
            debt.name = name;
            debt.current_balance = current_balance;
            debt.apr = apr;
            debt.due_date = due_date;
            service.update_debt(&debt)
        })?;
        Ok((debt.uuid, "Debt updated.".to_string()))
    })
}

/// Deletes a debt together with its payment history.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_delete(debt_id: String) -> ActionResponse {
    run_action("debt_delete", |conn| {
        let id = parse_uuid("debt_id", &debt_id)?;
        let removed = with_debt_service(conn, |service| service.delete_debt(id))?;
        Ok((id, format!("Debt deleted with {removed} payment(s).")))
    })
}

/// Records a payment and debits the chosen debt.
///
/// `debt_id = None` (or blank) models the standalone flow with nothing
/// selected and fails with a "no debt selected" message.
#[flutter_rust_bridge::frb(sync)]
pub fn payment_record(
    debt_id: Option<String>,
    amount: String,
    paid_on: String,
    note: String,
) -> ActionResponse {
    run_action("payment_record", |conn| {
        let request = RecordPaymentRequest {
            debt_id: non_blank(debt_id)
                .map(|raw| parse_uuid("debt_id", &raw))
                .transpose()?,
            amount: parse_decimal("amount", &amount)?,
            paid_on: parse_date("paid_on", &paid_on)?,
            note: note.trim().to_string(),
        };
        let receipt = with_payment_service(conn, |service| service.record_payment_for(&request))?;
        Ok((receipt.payment.uuid, "Payment recorded.".to_string()))
    })
}

/// Amends amount, date and note of a payment; the debt balance follows.
#[flutter_rust_bridge::frb(sync)]
pub fn payment_update(
    payment_id: String,
    amount: String,
    paid_on: String,
    note: String,
) -> ActionResponse {
    run_action("payment_update", |conn| {
        let id = parse_uuid("payment_id", &payment_id)?;
        let amount = parse_decimal("amount", &amount)?;
        let paid_on = parse_date("paid_on", &paid_on)?;
        let receipt = with_payment_service(conn, |service| {
            service.update_payment(id, amount, paid_on, note.trim())
        })?;
        Ok((receipt.payment.uuid, "Payment updated.".to_string()))
    })
}

/// Deletes a payment and restores its amount to the owning debt.
#[flutter_rust_bridge::frb(sync)]
pub fn payment_delete(payment_id: String) -> ActionResponse {
    run_action("payment_delete", |conn| {
        let id = parse_uuid("payment_id", &payment_id)?;
        let removed = with_payment_service(conn, |service| service.delete_payment(id))?;
        Ok((removed.payment.uuid, "Payment deleted.".to_string()))
    })
}

/// Lists the payment history of one debt, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn payments_list(debt_id: String) -> PaymentListResponse {
    let outcome = with_connection(|conn| {
        let id = parse_uuid("debt_id", &debt_id)?;
        with_payment_service(conn, |service| service.list_payments(id))
    });

    match outcome {
        Ok(payments) => {
            let items = payments.into_iter().map(to_payment_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No payments yet.".to_string()
            } else {
                format!("Found {} payment(s).", items.len())
            };
            PaymentListResponse {
                ok: true,
                message,
                items,
            }
        }
        Err(err) => PaymentListResponse {
            ok: false,
            message: format!("payments_list failed: {err}"),
            items: Vec::new(),
        },
    }
}

/// Compares a debt's balance with its payment history. Never modifies data.
#[flutter_rust_bridge::frb(sync)]
pub fn balance_audit(debt_id: String) -> BalanceAuditResponse {
    let outcome = with_connection(|conn| {
        let id = parse_uuid("debt_id", &debt_id)?;
        with_payment_service(conn, |service| service.audit_balance(id))
    });

    match outcome {
        Ok(audit) => to_audit_response(&audit),
        Err(err) => BalanceAuditResponse {
            ok: false,
            message: format!("balance_audit failed: {err}"),
            starting_balance: None,
            current_balance: None,
            payment_total: None,
            expected_balance: None,
            drift: None,
            consistent: false,
        },
    }
}

/// Loads stored preferences, falling back to first-launch defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_get() -> PreferencesResponse {
    let outcome = with_connection(|conn| {
        let repo = SqlitePreferencesRepository::try_new(conn).map_err(|err| err.to_string())?;
        repo.load_preferences().map_err(|err| err.to_string())
    });

    match outcome {
        Ok(preferences) => {
            PreferencesResponse::from_preferences(preferences, "Preferences loaded.")
        }
        Err(err) => PreferencesResponse::failure(format!("preferences_get failed: {err}")),
    }
}

/// Saves currency and theme preferences.
///
/// `currency_code` is matched case-insensitively against [`currency_codes`].
#[flutter_rust_bridge::frb(sync)]
pub fn preferences_set(
    currency_code: String,
    use_system_theme: bool,
    dark_mode: bool,
) -> PreferencesResponse {
    let outcome = with_connection(|conn| {
        let currency = Currency::from_code(&currency_code)
            .ok_or_else(|| format!("unsupported currency `{}`", currency_code.trim()))?;
        let preferences = Preferences {
            currency,
            theme: ThemePreference {
                use_system_theme,
                dark_mode,
            },
        };
        let repo = SqlitePreferencesRepository::try_new(conn).map_err(|err| err.to_string())?;
        repo.save_preferences(&preferences)
            .map_err(|err| err.to_string())?;
        Ok(preferences)
    });

    match outcome {
        Ok(preferences) => {
            PreferencesResponse::from_preferences(preferences, "Preferences saved.")
        }
        Err(err) => PreferencesResponse::failure(format!("preferences_set failed: {err}")),
    }
}

/// Supported currency codes in picker order.
#[flutter_rust_bridge::frb(sync)]
pub fn currency_codes() -> Vec<String> {
    Currency::ALL
        .into_iter()
        .map(|currency| currency.code().to_string())
        .collect()
}

/// Supported debt kinds in picker order.
#[flutter_rust_bridge::frb(sync)]
pub fn debt_kinds() -> Vec<DebtKindItem> {
    DebtKind::ALL
        .into_iter()
        .map(|kind| DebtKindItem {
            code: kind.code().to_string(),
            label: kind.label().to_string(),
        })
        .collect()
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn open_connection() -> Result<Connection, String> {
    open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn = open_connection()?;
    f(&conn)
}

fn with_debt_service<T>(
    conn: &Connection,
    f: impl FnOnce(&DebtService<SqliteDebtRepository<'_>>) -> Result<T, DebtServiceError>,
) -> Result<T, String> {
    let repo =
        SqliteDebtRepository::try_new(conn).map_err(|err| format!("debt repo init failed: {err}"))?;
    let service = DebtService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

fn with_payment_service<T>(
    conn: &Connection,
    f: impl FnOnce(&PaymentService<SqlitePaymentRepository<'_>>) -> Result<T, PaymentServiceError>,
) -> Result<T, String> {
    let repo = SqlitePaymentRepository::try_new(conn)
        .map_err(|err| format!("payment repo init failed: {err}"))?;
    let service = PaymentService::new(repo);
    f(&service).map_err(|err| err.to_string())
}

/// Runs one mutation and reloads the overview on the same connection.
fn run_action(
    operation: &str,
    action: impl FnOnce(&Connection) -> Result<(Uuid, String), String>,
) -> ActionResponse {
    match open_connection() {
        Ok(conn) => run_action_on(&conn, operation, action),
        Err(err) => {
            warn!("event=ffi_action module=ffi status=error op={operation}");
            ActionResponse::failure(format!("{operation} failed: {err}"))
        }
    }
}

/// A committed mutation always reports `ok=true` with its id; a failed
/// overview refresh only drops the read model.
fn run_action_on(
    conn: &Connection,
    operation: &str,
    action: impl FnOnce(&Connection) -> Result<(Uuid, String), String>,
) -> ActionResponse {
    let (id, message) = match action(conn) {
        Ok(committed) => committed,
        Err(err) => {
            warn!("event=ffi_action module=ffi status=error op={operation}");
            return ActionResponse::failure(format!("{operation} failed: {err}"));
        }
    };

    match load_overview_response(conn) {
        Ok(overview) => ActionResponse::success(message, id.to_string(), overview),
        Err(err) => {
            warn!("event=ffi_action module=ffi status=refresh_error op={operation}");
            ActionResponse::committed_without_overview(
                format!("{message} Overview refresh failed: {err}"),
                id.to_string(),
            )
        }
    }
}

fn load_overview_response(conn: &Connection) -> Result<OverviewResponse, String> {
    let repo = SqliteDebtRepository::try_new(conn)
        .map_err(|err| format!("debt repo init failed: {err}"))?;
    let overview = load_overview(&repo).map_err(|err| err.to_string())?;
    to_overview_response(overview)
}

fn to_overview_response(overview: Overview) -> Result<OverviewResponse, String> {
    let message = if overview.is_empty() {
        "No debts tracked.".to_string()
    } else {
        format!("Tracking {} debt(s).", overview.debts.len())
    };
    let summary = SummaryItem {
        total_current: overview.summary.total_current.to_string(),
        total_starting: overview.summary.total_starting.to_string(),
        total_paid: overview.summary.total_paid.to_string(),
        progress: overview.summary.progress_f64(),
        progress_percent: overview
            .summary
            .progress_percent()
            .map_err(|err| err.to_string())?,
    };

    Ok(OverviewResponse {
        ok: true,
        message,
        debts: to_debt_items(&overview.debts)?,
        upcoming: to_debt_items(&overview.upcoming)?,
        summary,
    })
}

fn to_debt_items(debts: &[Debt]) -> Result<Vec<DebtItem>, String> {
    debts.iter().map(to_debt_item).collect()
}

fn to_debt_item(debt: &Debt) -> Result<DebtItem, String> {
    let paid_amount = debt.paid_amount().map_err(|err| err.to_string())?;
    Ok(DebtItem {
        id: debt.uuid.to_string(),
        kind: debt.kind.code().to_string(),
        kind_label: debt.kind.label().to_string(),
        name: debt.name.clone(),
        starting_balance: debt.starting_balance.to_string(),
        current_balance: debt.current_balance.to_string(),
        paid_amount: paid_amount.to_string(),
        apr: debt.apr.map(|apr| apr.to_string()),
        due_date: debt.due_date.map(format_date),
    })
}

fn to_payment_item(payment: Payment) -> PaymentItem {
    PaymentItem {
        id: payment.uuid.to_string(),
        debt_id: payment.debt_id.to_string(),
        amount: payment.amount.to_string(),
        paid_on: format_date(payment.paid_on),
        note: payment.note,
    }
}

fn to_audit_response(audit: &BalanceAudit) -> BalanceAuditResponse {
    let message = if audit.is_consistent() {
        "Balance matches payment history.".to_string()
    } else {
        format!("Balance differs from payment history by {}.", audit.drift)
    };
    BalanceAuditResponse {
        ok: true,
        message,
        starting_balance: Some(audit.starting_balance.to_string()),
        current_balance: Some(audit.current_balance.to_string()),
        payment_total: Some(audit.payment_total.to_string()),
        expected_balance: Some(audit.expected_balance.to_string()),
        drift: Some(audit.drift.to_string()),
        consistent: audit.is_consistent(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid {field}: expected a UUID"))
}

fn parse_kind(raw: &str) -> Result<DebtKind, String> {
    DebtKind::from_code(raw.trim()).ok_or_else(|| format!("unsupported debt kind `{}`", raw.trim()))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("invalid {field}: expected a decimal number"))
}

fn parse_optional_decimal(field: &str, raw: Option<String>) -> Result<Option<Decimal>, String> {
    non_blank(raw)
        .map(|value| parse_decimal(field, &value))
        .transpose()
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("invalid {field}: expected YYYY-MM-DD"))
}

fn parse_optional_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, String> {
    non_blank(raw)
        .map(|value| parse_date(field, &value))
        .transpose()
}
