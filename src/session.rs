//! Owner of the persisted auth token.
//!
//! Token presence is the only authentication signal the client trusts; it is
//! not revalidated on navigation. Every read and write of the stored
//! credential goes through [`AuthSession`], which is handed explicitly to the
//! gateway and to route gating.

use crate::db::{settings_repo, Db};
use crate::error::AppResult;

pub const AUTH_TOKEN_KEY: &str = "auth_token";

#[derive(Clone)]
pub struct AuthSession {
    db: Db,
}

impl AuthSession {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn token(&self) -> AppResult<Option<String>> {
        Ok(settings_repo::get_item(&self.db, AUTH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// A storage failure reads as "logged out".
    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                log::warn!("Could not read auth token: {}", e);
                false
            }
        }
    }

    pub fn store_token(&self, token: &str) -> AppResult<()> {
        settings_repo::set_item(&self.db, AUTH_TOKEN_KEY, token)?;
        log::info!("Auth token stored");
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        settings_repo::remove_item(&self.db, AUTH_TOKEN_KEY)?;
        log::info!("Auth token cleared");
        Ok(())
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
