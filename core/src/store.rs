//! Asynchronous handle over the calorie database.
//!
//! Every operation runs its SQLite work on tokio's blocking pool inside a
//! single transaction and resolves once with either a value or a
//! [`StoreError`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::db::Database;
use crate::error::{EngineError, StoreError, WriteOp};
use crate::models::{CalorieEntry, Category, EntryInput, Month};

#[derive(Clone)]
pub struct EntryStore {
    db: Arc<Mutex<Database>>,
}

impl EntryStore {
    /// Opens (creating if absent) the database at `path`, bringing its schema
    /// up to `version` before returning.
    pub async fn open(path: impl AsRef<Path>, version: u32) -> Result<Self, StoreError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        tracing::debug!(path = %path.display(), version, "opening calorie database");
        let db = tokio::task::spawn_blocking(move || Database::open(&path, version))
            .await
            .map_err(StoreError::open)?
            .map_err(|e| {
                tracing::error!(error = %e, "failed to open calorie database");
                StoreError::open(e)
            })?;
        Ok(Self::from_database(db))
    }

    pub async fn open_in_memory(version: u32) -> Result<Self, StoreError> {
        let db = tokio::task::spawn_blocking(move || Database::open_in_memory(version))
            .await
            .map_err(StoreError::open)?
            .map_err(StoreError::open)?;
        Ok(Self::from_database(db))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, EngineError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&db)
        })
        .await?
    }

    /// Stores a new entry and returns its id. A missing date becomes today's
    /// local date.
    pub async fn add(&self, entry: EntryInput) -> Result<i64, StoreError> {
        let id = self
            .with_db(move |db| db.insert_entry(&entry))
            .await
            .map_err(|e| write_failed(WriteOp::Add, e))?;
        tracing::debug!(id, "added calorie entry");
        Ok(id)
    }

    /// Replaces the whole record stored under `entry.id`. An unknown id is
    /// inserted at that key.
    pub async fn update(&self, entry: CalorieEntry) -> Result<(), StoreError> {
        let id = entry.id;
        self.with_db(move |db| db.put_entry(&entry))
            .await
            .map_err(|e| write_failed(WriteOp::Update, e))?;
        tracing::debug!(id, "updated calorie entry");
        Ok(())
    }

    /// Removes the entry if present. Deleting an unknown id is not an error.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let removed = self
            .with_db(move |db| db.delete_entry(id))
            .await
            .map_err(|e| write_failed(WriteOp::Delete, e))?;
        tracing::debug!(id, removed, "deleted calorie entry");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<CalorieEntry>, StoreError> {
        self.with_db(move |db| db.get_entry(id))
            .await
            .map_err(read_failed)
    }

    /// Entries dated within `month`, ordered by date then insertion.
    pub async fn query_by_month(&self, month: Month) -> Result<Vec<CalorieEntry>, StoreError> {
        let (first, last) = (month.first_day(), month.last_day());
        let entries = self
            .with_db(move |db| db.get_entries_between(first, last))
            .await
            .map_err(read_failed)?;
        tracing::debug!(%month, count = entries.len(), "queried calorie entries by month");
        Ok(entries)
    }

    pub async fn query_by_category(
        &self,
        category: Category,
    ) -> Result<Vec<CalorieEntry>, StoreError> {
        let entries = self
            .with_db(move |db| db.get_entries_for_category(category))
            .await
            .map_err(read_failed)?;
        tracing::debug!(%category, count = entries.len(), "queried calorie entries by category");
        Ok(entries)
    }
}

fn write_failed(op: WriteOp, e: EngineError) -> StoreError {
    tracing::warn!(%op, error = %e, "calorie entry write failed");
    StoreError::write(op, e)
}

fn read_failed(e: EngineError) -> StoreError {
    tracing::warn!(error = %e, "calorie entry read failed");
    StoreError::read(e)
}
