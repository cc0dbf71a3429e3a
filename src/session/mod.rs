//! Bearer-token lifecycle.
//!
//! One [`SessionManager`] per execution context owns exactly one
//! [`TokenStore`]; the HTTP layer reads it before every request.

pub mod cookie;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::SessionError;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileTokenStore::new(path)))
    }

    pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        self.store.save(token)?;
        info!("session token stored");
        Ok(())
    }

    /// Unreadable storage counts as no token.
    pub fn get_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token store unreadable; treating session as anonymous");
                None
            }
        }
    }

    pub fn remove_token(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        debug!("session token removed");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}
