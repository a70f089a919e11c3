//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `debtr_core` linkage.
//! - Print a read-only ledger summary when a database is given.
//!
//! Usage: `debtr_cli [db_path]`; falls back to `DEBTR_DB_PATH`.

use debtr_core::db::open_db;
use debtr_core::{load_overview, Overview, SqliteDebtRepository};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("debtr_core ping={}", debtr_core::ping());
    println!("debtr_core version={}", debtr_core::core_version());

    let Some(db_path) = resolve_db_path() else {
        return ExitCode::SUCCESS;
    };

    match read_overview(&db_path) {
        Ok(overview) => {
            print_overview(&overview);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("debtr_cli: {}: {err}", db_path.display());
            ExitCode::FAILURE
        }
    }
}

fn resolve_db_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("DEBTR_DB_PATH").map(PathBuf::from))
        .filter(|path| !path.as_os_str().is_empty())
}

fn read_overview(db_path: &Path) -> Result<Overview, String> {
    if !db_path.exists() {
        return Err("database file not found".to_string());
    }
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteDebtRepository::try_new(&conn).map_err(|err| err.to_string())?;
    load_overview(&repo).map_err(|err| err.to_string())
}

fn print_overview(overview: &Overview) {
    let summary = &overview.summary;
    println!("debts={}", overview.debts.len());
    println!("total_starting={}", summary.total_starting);
    println!("total_current={}", summary.total_current);
    println!("total_paid={}", summary.total_paid);
    match summary.progress_percent() {
        Ok(percent) => println!("progress_percent={percent}"),
        Err(err) => println!("progress_percent=unavailable ({err})"),
    }

    for debt in &overview.upcoming {
        if let Some(due_date) = debt.due_date {
            println!(
                "upcoming due_date={} kind={} current_balance={}",
                due_date.format("%Y-%m-%d"),
                debt.kind.code(),
                debt.current_balance
            );
        }
    }
}
