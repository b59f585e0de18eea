use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use kcal_core::db::SCHEMA_VERSION;

/// Name of the calorie database inside the data directory.
pub const DB_NAME: &str = "caloriesdb";

pub struct Config {
    pub db_path: PathBuf,
    pub schema_version: u32,
}

impl Config {
    /// Resolve where the database lives. `db_override` (from `--db`) wins over
    /// the per-user data directory.
    pub fn load(db_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_override {
            Some(path) => path,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "kcal")
                    .context("Could not determine home directory")?;
                let data_dir = proj_dirs.data_dir().to_path_buf();
                std::fs::create_dir_all(&data_dir).with_context(|| {
                    format!("Failed to create data directory: {}", data_dir.display())
                })?;
                data_dir.join(format!("{DB_NAME}.db"))
            }
        };

        Ok(Config {
            db_path,
            schema_version: SCHEMA_VERSION,
        })
    }
}
