//! Preferences repository backed by the `preferences` key/value table.
//!
//! # Invariants
//! - Missing keys fall back to `Preferences::default()` values.
//! - Unknown stored values are rejected as invalid data.
//! - `save_preferences` writes every key in one transaction.

use crate::repo::debt_repo::{RepoError, RepoResult};
use crate::repo::sql_support::ensure_table_ready;
use crate::settings::{Currency, Preferences};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const KEY_CURRENCY: &str = "currency_code";
const KEY_USE_SYSTEM_THEME: &str = "use_system_theme";
const KEY_DARK_MODE: &str = "dark_mode";

/// Repository interface for user preferences.
pub trait PreferencesRepository {
    fn load_preferences(&self) -> RepoResult<Preferences>;
    fn save_preferences(&self, preferences: &Preferences) -> RepoResult<()>;
}

/// SQLite-backed preferences repository.
pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "preferences", &["key", "value", "updated_at"])?;
        Ok(Self { conn })
    }
}

impl PreferencesRepository for SqlitePreferencesRepository<'_> {
    fn load_preferences(&self) -> RepoResult<Preferences> {
        let mut preferences = Preferences::default();

        if let Some(code) = read_value(self.conn, KEY_CURRENCY)? {
            preferences.currency = Currency::from_code(&code).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "unsupported currency `{code}` in preferences.{KEY_CURRENCY}"
                ))
            })?;
        }
        if let Some(value) = read_value(self.conn, KEY_USE_SYSTEM_THEME)? {
            preferences.theme.use_system_theme = parse_flag(&value, KEY_USE_SYSTEM_THEME)?;
        }
        if let Some(value) = read_value(self.conn, KEY_DARK_MODE)? {
            preferences.theme.dark_mode = parse_flag(&value, KEY_DARK_MODE)?;
        }

        Ok(preferences)
    }

    fn save_preferences(&self, preferences: &Preferences) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let entries = [
            (KEY_CURRENCY, preferences.currency.code()),
            (KEY_USE_SYSTEM_THEME, flag_to_db(preferences.theme.use_system_theme)),
            (KEY_DARK_MODE, flag_to_db(preferences.theme.dark_mode)),
        ];

        for (key, value) in entries {
            tx.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE
                 SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn read_value(conn: &Connection, key: &str) -> RepoResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM preferences WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn parse_flag(value: &str, key: &str) -> RepoResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag `{other}` in preferences.{key}"
        ))),
    }
}

fn flag_to_db(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
