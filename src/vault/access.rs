// Access gate for the Data Vault. Keys are a format check, not real credentials.
use crate::error::VaultError;
use crate::storage::{KeyValueStore, KeyValueStoreExt, VAULT_API_KEY};

use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use std::sync::Arc;

pub const API_KEY_PREFIX: &str = "px_";

static API_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^px_[0-9a-f]{64}$").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Any well-formed key is accepted.
    #[default]
    FormatOnly,
    /// The key must equal the one stored locally.
    IssuedOnly,
}

pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

pub fn is_well_formed(key: &str) -> bool {
    API_KEY_PATTERN.is_match(key)
}

pub struct AccessGate {
    store: Arc<dyn KeyValueStore>,
    passcode: String,
    policy: KeyPolicy,
}

impl AccessGate {
    pub fn new(store: Arc<dyn KeyValueStore>, passcode: impl Into<String>) -> Self {
        Self {
            store,
            passcode: passcode.into(),
            policy: KeyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    pub fn stored_key(&self) -> Option<String> {
        match self.store.load::<String>(VAULT_API_KEY) {
            Ok(key) => key,
            Err(e) => {
                log::warn!("Could not read stored vault key: {e}");
                None
            }
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.stored_key().is_some_and(|key| is_well_formed(&key))
    }

    pub fn validate(&self, key: &str) -> bool {
        if !is_well_formed(key) {
            return false;
        }
        match self.policy {
            KeyPolicy::FormatOnly => true,
            KeyPolicy::IssuedOnly => self.stored_key().is_some_and(|stored| stored == key),
        }
    }

    pub fn unlock_with_key(&self, key: &str) -> Result<(), VaultError> {
        let key = key.trim();
        if !self.validate(key) {
            return Err(VaultError::InvalidApiKey);
        }
        self.store.save(VAULT_API_KEY, key)?;
        log::info!("Data vault unlocked with API key");
        Ok(())
    }

    // Issues and stores a fresh key when the passcode matches.
    pub fn unlock_with_passcode(&self, code: &str) -> Result<String, VaultError> {
        if self.passcode.is_empty() || code.trim() != self.passcode {
            return Err(VaultError::InvalidCredentials);
        }
        let key = generate_api_key();
        self.store.save(VAULT_API_KEY, &key)?;
        log::info!("Data vault unlocked with passcode");
        Ok(key)
    }

    pub fn lock(&self) -> Result<(), VaultError> {
        self.store.remove(VAULT_API_KEY)?;
        Ok(())
    }
}
