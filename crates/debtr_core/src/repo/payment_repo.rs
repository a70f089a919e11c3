//! Payment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist payments against their owning debt.
//! - Pair every payment write with the matching debt balance adjustment.
//!
//! # Invariants
//! - Insert, update and delete run in one `IMMEDIATE` transaction together
//!   with the owning debt's `current_balance` rewrite; a failure leaves both
//!   untouched.
//! - A payment never changes owner.
//! - Payment history is ordered `paid_on DESC`, newest insert first on ties.

use crate::model::debt::{Debt, DebtId};
use crate::model::payment::{Payment, PaymentId};
use crate::repo::debt_repo::{load_debt, store_current_balance, RepoError, RepoResult};
use crate::repo::sql_support::{
    decimal_to_db, ensure_table_ready, parse_date, parse_decimal, parse_uuid,
};
use rust_decimal::Decimal;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const PAYMENT_SELECT_SQL: &str = "SELECT
    uuid,
    debt_uuid,
    amount,
    paid_on,
    note
FROM payments";

const PAYMENT_COLUMNS: &[&str] = &[
    "uuid",
    "debt_uuid",
    "amount",
    "paid_on",
    "note",
    "created_at",
];

/// Outcome of removing one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedPayment {
    /// The payment as it was stored before removal.
    pub payment: Payment,
    /// Owning debt's current balance after the amount was restored.
    pub balance_after: Decimal,
}

/// Repository interface for payment bookkeeping.
pub trait PaymentRepository {
    /// Inserts `payment` and debits its debt. Returns the new debt balance.
    fn record_payment(&self, payment: &Payment) -> RepoResult<Decimal>;
    /// Rewrites amount, date and note, applying the amount delta to the debt.
    /// Returns the new debt balance.
    fn update_payment(&self, payment: &Payment) -> RepoResult<Decimal>;
    /// Credits the owning debt and removes the payment.
    fn delete_payment(&self, id: PaymentId) -> RepoResult<RemovedPayment>;
    fn get_payment(&self, id: PaymentId) -> RepoResult<Option<Payment>>;
    fn list_payments(&self, debt_id: DebtId) -> RepoResult<Vec<Payment>>;
    /// Sum of all payment amounts currently stored for `debt_id`.
    fn payment_total(&self, debt_id: DebtId) -> RepoResult<Decimal>;
    /// Loads the debt that owns payments recorded under `debt_id`.
    fn get_owner(&self, debt_id: DebtId) -> RepoResult<Option<Debt>>;
}

/// SQLite-backed payment repository.
pub struct SqlitePaymentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePaymentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "payments", PAYMENT_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl PaymentRepository for SqlitePaymentRepository<'_> {
    fn record_payment(&self, payment: &Payment) -> RepoResult<Decimal> {
        payment.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut debt = require_debt(&tx, payment.debt_id)?;
        let balance = debt.debit(payment.amount)?;

        tx.execute(
            "INSERT INTO payments (
                uuid,
                debt_uuid,
                amount,
                paid_on,
                note
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                payment.uuid.to_string(),
                payment.debt_id.to_string(),
                decimal_to_db(payment.amount),
                payment.paid_on,
                payment.note.as_str(),
            ],
        )?;
        store_current_balance(&tx, &debt)?;

        tx.commit()?;
        Ok(balance)
    }

    fn update_payment(&self, payment: &Payment) -> RepoResult<Decimal> {
        payment.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let stored = load_payment(&tx, payment.uuid)?
            .ok_or(RepoError::PaymentNotFound(payment.uuid))?;
        if stored.debt_id != payment.debt_id {
            return Err(RepoError::PaymentOwnerChanged(payment.uuid));
        }

        let mut debt = require_debt(&tx, stored.debt_id)?;
        debt.credit(stored.amount)?;
        let balance = debt.debit(payment.amount)?;

        tx.execute(
            "UPDATE payments
             SET
                amount = ?1,
                paid_on = ?2,
                note = ?3
             WHERE uuid = ?4;",
            params![
                decimal_to_db(payment.amount),
                payment.paid_on,
                payment.note.as_str(),
                payment.uuid.to_string(),
            ],
        )?;
        store_current_balance(&tx, &debt)?;

        tx.commit()?;
        Ok(balance)
    }

    fn delete_payment(&self, id: PaymentId) -> RepoResult<RemovedPayment> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let payment = load_payment(&tx, id)?.ok_or(RepoError::PaymentNotFound(id))?;

        let mut debt = require_debt(&tx, payment.debt_id)?;
        let balance_after = debt.credit(payment.amount)?;
        store_current_balance(&tx, &debt)?;
        tx.execute("DELETE FROM payments WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(RemovedPayment {
            payment,
            balance_after,
        })
    }

    fn get_payment(&self, id: PaymentId) -> RepoResult<Option<Payment>> {
        load_payment(self.conn, id)
    }

    fn list_payments(&self, debt_id: DebtId) -> RepoResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PAYMENT_SELECT_SQL}
             WHERE debt_uuid = ?1
             ORDER BY paid_on DESC, created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([debt_id.to_string()])?;
        let mut payments = Vec::new();

        while let Some(row) = rows.next()? {
            payments.push(parse_payment_row(row)?);
        }

        Ok(payments)
    }

    fn payment_total(&self, debt_id: DebtId) -> RepoResult<Decimal> {
        let mut stmt = self
            .conn
            .prepare("SELECT amount FROM payments WHERE debt_uuid = ?1;")?;
        let mut rows = stmt.query([debt_id.to_string()])?;
        let mut total = Decimal::ZERO;

        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            let amount = parse_decimal(&text, "payments.amount")?;
            total = total.checked_add(amount).ok_or_else(|| {
                RepoError::InvalidData(format!("payment total overflowed for debt {debt_id}"))
            })?;
        }

        Ok(total)
    }

    fn get_owner(&self, debt_id: DebtId) -> RepoResult<Option<Debt>> {
        load_debt(self.conn, debt_id)
    }
}

fn require_debt(conn: &Connection, id: DebtId) -> RepoResult<Debt> {
    load_debt(conn, id)?.ok_or(RepoError::DebtNotFound(id))
}

fn load_payment(conn: &Connection, id: PaymentId) -> RepoResult<Option<Payment>> {
    let mut stmt = conn.prepare(&format!("{PAYMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_payment_row(row)?));
    }

    Ok(None)
}

fn parse_payment_row(row: &Row<'_>) -> RepoResult<Payment> {
    let uuid_text: String = row.get("uuid")?;
    let debt_text: String = row.get("debt_uuid")?;
    let amount_text: String = row.get("amount")?;
    let paid_on_text: String = row.get("paid_on")?;

    let payment = Payment {
        uuid: parse_uuid(&uuid_text, "payments.uuid")?,
        debt_id: parse_uuid(&debt_text, "payments.debt_uuid")?,
        amount: parse_decimal(&amount_text, "payments.amount")?,
        paid_on: parse_date(&paid_on_text, "payments.paid_on")?,
        note: row.get("note")?,
    };
    payment.validate()?;
    Ok(payment)
}
