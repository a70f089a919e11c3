use chrono::NaiveDate;
use debtr_core::db::open_db_in_memory;
use debtr_core::{
    Debt, DebtKind, DebtListQuery, DebtRepository, DebtService, DebtServiceError,
    NewDebtRequest, NullsOrder, Payment, PaymentRepository, RepoError, SqliteDebtRepository,
    SqlitePaymentRepository,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(name: &str, starting: &str, due_date: Option<NaiveDate>) -> NewDebtRequest {
    NewDebtRequest {
        kind: DebtKind::CreditCard,
        name: name.to_string(),
        starting_balance: dec(starting),
        current_balance: None,
        apr: None,
        due_date,
    }
}

#[test]
fn create_and_get_debt_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDebtRepository::try_new(&conn).unwrap();

    let mut debt = Debt::new(DebtKind::PersonalLoan, "Student loan", dec("18250.75"));
    debt.apr = Some(dec("4.99"));
    debt.due_date = Some(day(2026, 9, 15));

    let id = repo.create_debt(&debt).unwrap();
    assert_eq!(id, debt.uuid);

    let loaded = repo.get_debt(id).unwrap().unwrap();
    assert_eq!(loaded, debt);
    assert_eq!(loaded.starting_balance.to_string(), "18250.75");
}

#[test]
fn get_debt_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDebtRepository::try_new(&conn).unwrap();

    assert!(repo.get_debt(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn create_debt_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let err = service.create_debt(&request("   ", "100", None)).unwrap_err();
    assert!(matches!(err, DebtServiceError::InvalidName));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM debts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn create_debt_trims_name_and_defaults_current_balance() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let created = service
        .create_debt(&request("  Visa  ", "1500.00", None))
        .unwrap();
    assert_eq!(created.name, "Visa");
    assert_eq!(created.current_balance, dec("1500.00"));
}

#[test]
fn create_debt_accepts_explicit_current_balance() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let mut new_debt = request("Mastercard", "2000", None);
    new_debt.current_balance = Some(dec("1200"));
    let created = service.create_debt(&new_debt).unwrap();

    assert_eq!(created.starting_balance, dec("2000"));
    assert_eq!(created.current_balance, dec("1200"));
    assert_eq!(created.paid_amount().unwrap(), dec("800"));
}

#[test]
fn update_debt_keeps_starting_balance() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());
    let created = service.create_debt(&request("Visa", "1000", None)).unwrap();

    let mut edited = created.clone();
    edited.name = " Visa Platinum ".to_string();
    edited.kind = DebtKind::LineOfCredit;
    edited.starting_balance = dec("99999");
    edited.current_balance = dec("950");
    edited.apr = Some(dec("21.5"));
    edited.due_date = Some(day(2026, 12, 1));

    let updated = service.update_debt(&edited).unwrap();
    assert_eq!(updated.name, "Visa Platinum");
    assert_eq!(updated.kind, DebtKind::LineOfCredit);
    assert_eq!(updated.starting_balance, dec("1000"));
    assert_eq!(updated.current_balance, dec("950"));
    assert_eq!(updated.apr, Some(dec("21.5")));
    assert_eq!(updated.due_date, Some(day(2026, 12, 1)));
}

#[test]
fn update_debt_reports_missing_debt_and_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let ghost = Debt::new(DebtKind::PersonalDebt, "Ghost", dec("10"));
    let err = service.update_debt(&ghost).unwrap_err();
    assert!(matches!(err, DebtServiceError::DebtNotFound(id) if id == ghost.uuid));

    let created = service.create_debt(&request("Visa", "10", None)).unwrap();
    let mut blank = created;
    blank.name = "\t".to_string();
    assert!(matches!(
        service.update_debt(&blank).unwrap_err(),
        DebtServiceError::InvalidName
    ));
}

#[test]
fn list_debts_orders_by_due_date_with_configurable_nulls() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let undated = service.create_debt(&request("Undated", "10", None)).unwrap();
    let late = service
        .create_debt(&request("Late", "10", Some(day(2026, 3, 1))))
        .unwrap();
    let early = service
        .create_debt(&request("Early", "10", Some(day(2026, 1, 1))))
        .unwrap();

    let nulls_last: Vec<_> = service
        .list_debts(NullsOrder::Last)
        .unwrap()
        .into_iter()
        .map(|debt| debt.uuid)
        .collect();
    assert_eq!(nulls_last, vec![early.uuid, late.uuid, undated.uuid]);

    let nulls_first: Vec<_> = service
        .list_debts(NullsOrder::First)
        .unwrap()
        .into_iter()
        .map(|debt| debt.uuid)
        .collect();
    assert_eq!(nulls_first, vec![undated.uuid, early.uuid, late.uuid]);
}

#[test]
fn list_debts_breaks_due_date_ties_by_name_and_honors_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDebtRepository::try_new(&conn).unwrap();
    let due = Some(day(2026, 5, 5));

    for name in ["charlie", "Alpha", "bravo"] {
        let mut debt = Debt::new(DebtKind::CreditCard, name, dec("1"));
        debt.due_date = due;
        repo.create_debt(&debt).unwrap();
    }

    let names: Vec<_> = repo
        .list_debts(&DebtListQuery::default())
        .unwrap()
        .into_iter()
        .map(|debt| debt.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "bravo", "charlie"]);

    let limited = repo
        .list_debts(&DebtListQuery {
            nulls: NullsOrder::Last,
            limit: Some(2),
        })
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn delete_debt_cascades_to_payments() {
    let conn = open_db_in_memory().unwrap();
    let debts = SqliteDebtRepository::try_new(&conn).unwrap();
    let payments = SqlitePaymentRepository::try_new(&conn).unwrap();

    let debt = Debt::new(DebtKind::CreditCard, "Visa", dec("500"));
    let other = Debt::new(DebtKind::CreditCard, "Amex", dec("500"));
    debts.create_debt(&debt).unwrap();
    debts.create_debt(&other).unwrap();

    for amount in ["10", "20", "30"] {
        let payment = Payment::new(debt.uuid, dec(amount), day(2026, 1, 1), "");
        payments.record_payment(&payment).unwrap();
    }
    let kept = Payment::new(other.uuid, dec("5"), day(2026, 1, 1), "");
    payments.record_payment(&kept).unwrap();

    let removed = debts.delete_debt(debt.uuid).unwrap();
    assert_eq!(removed, 3);
    assert!(debts.get_debt(debt.uuid).unwrap().is_none());

    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM payments WHERE debt_uuid = ?1;",
            [debt.uuid.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
    assert_eq!(payments.list_payments(other.uuid).unwrap().len(), 1);
}

#[test]
fn delete_debt_reports_missing_debt() {
    let conn = open_db_in_memory().unwrap();
    let service = DebtService::new(SqliteDebtRepository::try_new(&conn).unwrap());

    let missing = Uuid::new_v4();
    let err = service.delete_debt(missing).unwrap_err();
    assert!(matches!(err, DebtServiceError::DebtNotFound(id) if id == missing));
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteDebtRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn read_path_rejects_corrupted_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDebtRepository::try_new(&conn).unwrap();
    let debt = Debt::new(DebtKind::CreditCard, "Visa", dec("100"));
    repo.create_debt(&debt).unwrap();

    conn.execute(
        "UPDATE debts SET current_balance = 'lots' WHERE uuid = ?1;",
        [debt.uuid.to_string()],
    )
    .unwrap();

    let err = repo.get_debt(debt.uuid).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("current_balance")));
}

#[test]
fn repository_rejects_connection_without_foreign_keys() {
    let mut conn = Connection::open_in_memory().unwrap();
    debtr_core::db::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();

    let err = SqliteDebtRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::ForeignKeysDisabled));
    let err = SqlitePaymentRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::ForeignKeysDisabled));

    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    assert!(SqliteDebtRepository::try_new(&conn).is_ok());
}

#[test]
fn read_path_rejects_malformed_due_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDebtRepository::try_new(&conn).unwrap();
    let debt = repo_debt_with_due_date(&repo);

    conn.execute(
        "UPDATE debts SET due_date = 'soon' WHERE uuid = ?1;",
        [debt.uuid.to_string()],
    )
    .unwrap();

    let err = repo.get_debt(debt.uuid).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("due_date")));
    let err = repo.list_debts(&DebtListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn repo_debt_with_due_date(repo: &SqliteDebtRepository<'_>) -> Debt {
    let mut debt = Debt::new(DebtKind::PersonalLoan, "Car", dec("5000"));
    debt.due_date = Some(day(2026, 5, 1));
    repo.create_debt(&debt).unwrap();
    debt
}
