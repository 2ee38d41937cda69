use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "mailcake";
const SESSION_KEY: &str = "session";

/// Somewhere to keep the backend session cookie between runs.
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    access_token: String,
}

/// Session storage in the OS keyring.
pub struct RingStorage;

impl RingStorage {
    fn entry() -> Result<Entry> {
        Entry::new(APP_NAME, SESSION_KEY).map_err(|e| anyhow::anyhow!("Keyring error: {}", e))
    }
}

impl SessionStore for RingStorage {
    fn load(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(serialized) => {
                let data: SessionData = serde_json::from_str(&serialized)
                    .context("Failed to deserialize session")?;
                Ok(Some(data.access_token))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Keyring error: {}", e)),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        let serialized = serde_json::to_string(&SessionData {
            access_token: token.to_string(),
        })
        .context("Failed to serialize session")?;
        Self::entry()?
            .set_password(&serialized)
            .map_err(|e| anyhow::anyhow!("Keyring error: {}", e))
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("Keyring error: {}", e)),
        }
    }
}

/// Accepts either the bare cookie value or a pasted `access_token=...` pair.
pub fn normalize_token(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let value = trimmed
        .split(';')
        .next()
        .map(str::trim)
        .map(|pair| {
            pair.strip_prefix(crate::api::SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .unwrap_or(pair)
        })
        .unwrap_or(trimmed);
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    /// Waiting for `GET /auth/gmail`.
    FetchingUrl,
    /// Browser opened; waiting for the user to paste the session cookie.
    AwaitingToken { url: String },
    Failed,
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory store shared with the test that created it.
    #[derive(Clone, Default)]
    pub struct MemoryStore(pub Arc<Mutex<Option<String>>>);

    impl SessionStore for MemoryStore {
        fn load(&self) -> Result<Option<String>> {
            Ok(self.0.lock().unwrap().clone())
        }

        fn save(&self, token: &str) -> Result<()> {
            *self.0.lock().unwrap() = Some(token.to_string());
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }
}
