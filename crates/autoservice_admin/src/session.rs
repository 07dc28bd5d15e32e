// --- File: crates/autoservice_admin/src/session.rs ---
//! Where the "operator is logged in" flag lives.
//!
//! The flag only spares the operator from re-typing the password. It is not an access
//! control: the backend has to authorize toggles on its own.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key under which the login flag is stored.
pub const AUTH_KEY: &str = "adminAuthenticated";

/// Small key-value store scoped to one operator session.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process store; forgotten when the process ends.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}
