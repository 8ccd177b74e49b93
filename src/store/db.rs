use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::models::date_key::DateKey;
use crate::models::day::DayRecord;

pub type DB = BTreeMap<DateKey, DayRecord>;

const DB_FILE: &str = "days.json";

pub fn db_file(location: &Path) -> PathBuf {
    location.join(DB_FILE)
}

/// Loads the snapshot from `location`. A missing snapshot is an empty DB.
pub fn load_db(location: &Path) -> Result<DB, StoreError> {
    let path = db_file(location);
    if !path.exists() {
        debug!("No snapshot at {}, starting empty", path.display());
        return Ok(DB::new());
    }
    let content = fs::read_to_string(&path)?;
    let db: DB = serde_json::from_str(&content)?;
    debug!("Loaded {} day records from {}", db.len(), path.display());
    Ok(db)
}

/// Writes the snapshot to a temp file first so a crash never leaves a
/// truncated `days.json` behind.
pub fn save_db(location: &Path, db: &DB) -> Result<(), StoreError> {
    fs::create_dir_all(location)?;
    let path = db_file(location);
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(db)?;
    fs::write(&tmp, content)?;
    fs::rename(&tmp, &path)?;
    Ok(())
}
