pub mod migrations;
pub mod settings_repo;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::AppResult;

/// Shared SQLite connection.
pub type Db = Arc<Mutex<Connection>>;

pub fn open() -> AppResult<Db> {
    let conn = migrations::init_db()?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn memory() -> AppResult<Db> {
    let conn = migrations::init_memory_db()?;
    Ok(Arc::new(Mutex::new(conn)))
}
