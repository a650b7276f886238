use rusqlite::params;

use crate::db::Db;
use crate::error::{AppError, AppResult};

pub fn get_item(db: &Db, key: &str) -> AppResult<Option<String>> {
    let db = db.lock().map_err(|e| AppError::Database(e.to_string()))?;
    let result = db.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

pub fn set_item(db: &Db, key: &str, value: &str) -> AppResult<()> {
    let db = db.lock().map_err(|e| AppError::Database(e.to_string()))?;
    db.execute(
        "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )
    .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

pub fn remove_item(db: &Db, key: &str) -> AppResult<()> {
    let db = db.lock().map_err(|e| AppError::Database(e.to_string()))?;
    db.execute("DELETE FROM settings WHERE key = ?1", params![key])
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}
