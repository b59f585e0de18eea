use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, params};

use crate::error::EngineError;
use crate::models::{CalorieEntry, Category, EntryInput, MAX_YEAR, MIN_YEAR, today};

/// Schema version this build opens by default.
pub const SCHEMA_VERSION: u32 = 1;

/// Newest schema version `migrate` knows how to build.
const LATEST_VERSION: u32 = 1;

const DATE_FORMAT: &str = "%Y-%m-%d";

const ENTRY_COLUMNS: &str = "id, calories, category, description, date";

/// Dates are compared as text, so only four-digit years may be stored.
fn sql_date(date: NaiveDate) -> Result<String, EngineError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        return Err(EngineError::DateOutOfRange(date));
    }
    Ok(date.format(DATE_FORMAT).to_string())
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path, version: u32) -> Result<Self, EngineError> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate(version)?;
        Ok(db)
    }

    pub fn open_in_memory(version: u32) -> Result<Self, EngineError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate(version)?;
        Ok(db)
    }

    /// Stored schema version (`PRAGMA user_version`).
    pub fn schema_version(&self) -> Result<u32, EngineError> {
        let version = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    fn migrate(&self, requested: u32) -> Result<(), EngineError> {
        if requested == 0 {
            return Err(EngineError::ZeroVersion);
        }
        if requested > LATEST_VERSION {
            return Err(EngineError::UnsupportedVersion {
                requested,
                latest: LATEST_VERSION,
            });
        }

        let stored = self.schema_version()?;
        if requested < stored {
            return Err(EngineError::Downgrade { requested, stored });
        }
        if stored == requested {
            return Ok(());
        }

        let tx = self.conn.unchecked_transaction()?;
        if stored < 1 {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS calories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    calories REAL NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT NOT NULL,
                    date TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_calories_category ON calories(category);
                CREATE INDEX IF NOT EXISTS idx_calories_date ON calories(date);

                PRAGMA user_version = 1;",
            )?;
        }
        tx.commit()?;

        tracing::info!(from = stored, to = requested, "migrated calorie database schema");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // --- Row mapping helpers ---

    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<CalorieEntry> {
        let date: String = row.get(4)?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
        Ok(CalorieEntry {
            id: row.get(0)?,
            calories: row.get(1)?,
            category: row.get(2)?,
            description: row.get(3)?,
            date,
        })
    }

    // --- Entries ---

    /// Inserts a new entry and returns the id assigned to it.
    pub fn insert_entry(&self, entry: &EntryInput) -> Result<i64, EngineError> {
        let date = sql_date(entry.date.unwrap_or_else(today))?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO calories (calories, category, description, date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.calories,
                entry.category,
                entry.description,
                date,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// Replaces the record stored under `entry.id`, inserting it when absent.
    pub fn put_entry(&self, entry: &CalorieEntry) -> Result<(), EngineError> {
        let date = sql_date(entry.date)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO calories (id, calories, category, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                calories = excluded.calories,
                category = excluded.category,
                description = excluded.description,
                date = excluded.date",
            params![
                entry.id,
                entry.calories,
                entry.category,
                entry.description,
                date,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub fn delete_entry(&self, id: i64) -> Result<bool, EngineError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute("DELETE FROM calories WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<CalorieEntry>, EngineError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ENTRY_COLUMNS} FROM calories WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::entry_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Entries with `first <= date <= last`, by date then insertion order.
    pub fn get_entries_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<CalorieEntry>, EngineError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM calories
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date, id"
        ))?;
        let entries = stmt
            .query_map(
                params![sql_date(first)?, sql_date(last)?],
                Self::entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_entries_for_category(
        &self,
        category: Category,
    ) -> Result<Vec<CalorieEntry>, EngineError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM calories
             WHERE category = ?1
             ORDER BY date, id"
        ))?;
        let entries = stmt
            .query_map(params![category], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}
