//! Debt repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and ordering queries over canonical `debts` storage.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Debt::validate()` before SQL mutations.
//! - `starting_balance` is written once by `create_debt` and never updated.
//! - Deleting a debt relies on the `payments` foreign key cascade.
//! - Read paths must reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::debt::{Debt, DebtId, DebtKind, DebtValidationError};
use crate::model::payment::PaymentId;
use crate::repo::sql_support::{
    decimal_to_db, ensure_table_ready, parse_decimal, parse_optional_date, parse_optional_decimal,
    parse_uuid,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEBT_SELECT_SQL: &str = "SELECT
    uuid,
    kind,
    name,
    starting_balance,
    current_balance,
    apr,
    due_date
FROM debts";

const DEBT_COLUMNS: &[&str] = &[
    "uuid",
    "kind",
    "name",
    "starting_balance",
    "current_balance",
    "apr",
    "due_date",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by debt, payment and preferences persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(DebtValidationError),
    Db(DbError),
    DebtNotFound(DebtId),
    PaymentNotFound(PaymentId),
    /// An update tried to move a payment to a different debt.
    PaymentOwnerChanged(PaymentId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Connection has `PRAGMA foreign_keys` off, so cascades would not run.
    ForeignKeysDisabled,
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DebtNotFound(id) => write!(f, "debt not found: {id}"),
            Self::PaymentNotFound(id) => write!(f, "payment not found: {id}"),
            Self::PaymentOwnerChanged(id) => {
                write!(f, "payment {id} cannot be moved to another debt")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "ledger repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::ForeignKeysDisabled => {
                write!(f, "ledger repository requires foreign key enforcement")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "ledger repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "ledger repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DebtValidationError> for RepoError {
    fn from(value: DebtValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Placement of debts without a due date in due-date ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    #[default]
    Last,
}

/// Query options for listing debts.
///
/// Results are always ordered by due date ascending, then name, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebtListQuery {
    pub nulls: NullsOrder,
    pub limit: Option<u32>,
}

/// Repository interface for debt CRUD operations.
pub trait DebtRepository {
    fn create_debt(&self, debt: &Debt) -> RepoResult<DebtId>;
    /// Rewrites every mutable field. `starting_balance` is left untouched.
    fn update_debt(&self, debt: &Debt) -> RepoResult<()>;
    fn get_debt(&self, id: DebtId) -> RepoResult<Option<Debt>>;
    fn list_debts(&self, query: &DebtListQuery) -> RepoResult<Vec<Debt>>;
    /// Deletes the debt and, through the store cascade, its payments.
    ///
    /// Returns how many payments were removed with it.
    fn delete_debt(&self, id: DebtId) -> RepoResult<usize>;
}

/// SQLite-backed debt repository.
pub struct SqliteDebtRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDebtRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "debts", DEBT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl DebtRepository for SqliteDebtRepository<'_> {
    fn create_debt(&self, debt: &Debt) -> RepoResult<DebtId> {
        debt.validate()?;

        self.conn.execute(
            "INSERT INTO debts (
                uuid,
                kind,
                name,
                starting_balance,
                current_balance,
                apr,
                due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                debt.uuid.to_string(),
                debt.kind.code(),
                debt.name.as_str(),
                decimal_to_db(debt.starting_balance),
                decimal_to_db(debt.current_balance),
                debt.apr.map(decimal_to_db),
                debt.due_date,
            ],
        )?;

        Ok(debt.uuid)
    }

    fn update_debt(&self, debt: &Debt) -> RepoResult<()> {
        debt.validate()?;

        let changed = self.conn.execute(
            "UPDATE debts
             SET
                kind = ?1,
                name = ?2,
                current_balance = ?3,
                apr = ?4,
                due_date = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?6;",
            params![
                debt.kind.code(),
                debt.name.as_str(),
                decimal_to_db(debt.current_balance),
                debt.apr.map(decimal_to_db),
                debt.due_date,
                debt.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::DebtNotFound(debt.uuid));
        }

        Ok(())
    }

    fn get_debt(&self, id: DebtId) -> RepoResult<Option<Debt>> {
        load_debt(self.conn, id)
    }

    fn list_debts(&self, query: &DebtListQuery) -> RepoResult<Vec<Debt>> {
        let mut sql = format!("{DEBT_SELECT_SQL} ORDER BY ");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.nulls {
            NullsOrder::First => sql.push_str("due_date IS NULL DESC"),
            NullsOrder::Last => sql.push_str("due_date IS NULL ASC"),
        }
        sql.push_str(", due_date ASC, name COLLATE NOCASE ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut debts = Vec::new();

        while let Some(row) = rows.next()? {
            debts.push(parse_debt_row(row)?);
        }

        Ok(debts)
    }

    fn delete_debt(&self, id: DebtId) -> RepoResult<usize> {
        let id_text = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let payment_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM payments WHERE debt_uuid = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;

        let changed = tx.execute("DELETE FROM debts WHERE uuid = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::DebtNotFound(id));
        }

        tx.commit()?;
        Ok(payment_count as usize)
    }
}

/// Loads one debt through any connection or open transaction.
pub(crate) fn load_debt(conn: &Connection, id: DebtId) -> RepoResult<Option<Debt>> {
    let mut stmt = conn.prepare(&format!("{DEBT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_debt_row(row)?));
    }

    Ok(None)
}

/// Overwrites only the current balance of one debt.
pub(crate) fn store_current_balance(conn: &Connection, debt: &Debt) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE debts
         SET
            current_balance = ?1,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?2;",
        params![decimal_to_db(debt.current_balance), debt.uuid.to_string()],
    )?;

    if changed == 0 {
        return Err(RepoError::DebtNotFound(debt.uuid));
    }

    Ok(())
}

fn parse_debt_row(row: &Row<'_>) -> RepoResult<Debt> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "debts.uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = DebtKind::from_code(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid debt kind `{kind_text}` in debts.kind"))
    })?;

    let starting_text: String = row.get("starting_balance")?;
    let current_text: String = row.get("current_balance")?;

    let debt = Debt {
        uuid,
        kind,
        name: row.get("name")?,
        starting_balance: parse_decimal(&starting_text, "debts.starting_balance")?,
        current_balance: parse_decimal(&current_text, "debts.current_balance")?,
        apr: parse_optional_decimal(row.get("apr")?, "debts.apr")?,
        due_date: parse_optional_date(row.get("due_date")?, "debts.due_date")?,
    };
    debt.validate()?;
    Ok(debt)
}
