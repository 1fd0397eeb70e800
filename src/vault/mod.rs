pub mod access;
pub mod dataset;

pub use access::{API_KEY_PREFIX, AccessGate, KeyPolicy, generate_api_key, is_well_formed};
pub use dataset::{Dataset, DatasetSource, QueryOptions, QueryPage, Row};

use crate::error::VaultError;
use crate::rate_limiter::RateLimiter;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MANIFEST: [&str; 6] = [
    "ecobot_tweets.csv",
    "occultbot_tweets.csv",
    "sciencebot_tweets.csv",
    "ufobot_tweets.csv",
    "911bot_tweets.csv",
    "drugbot_tweets.csv",
];

static FILENAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9_-]+\.csv$").unwrap());

/// JSON envelope returned by the query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, VaultError>> for ApiResponse<T> {
    fn from(result: Result<T, VaultError>) -> Self {
        match result {
            Ok(data) => ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => ApiResponse {
                success: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub fn is_valid_filename(filename: &str) -> bool {
    FILENAME_PATTERN.is_match(filename)
}

/// CSV query layer: validates, rate limits keyed requests and caches parsed datasets.
pub struct DataVault {
    source: DatasetSource,
    gate: AccessGate,
    limiter: Mutex<RateLimiter>,
    cache: Mutex<HashMap<String, Arc<Dataset>>>,
}

impl DataVault {
    pub fn new(source: DatasetSource, gate: AccessGate) -> Self {
        Self {
            source,
            gate,
            limiter: Mutex::new(RateLimiter::default()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Mutex::new(limiter);
        self
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn list_files(&self) -> Vec<String> {
        MANIFEST.iter().map(|name| name.to_string()).collect()
    }

    pub async fn get_file_contents(
        &self,
        filename: &str,
        api_key: Option<&str>,
        options: &QueryOptions,
    ) -> Result<QueryPage, VaultError> {
        if !is_valid_filename(filename) {
            return Err(VaultError::InvalidFilename(filename.to_string()));
        }

        if let Some(key) = api_key {
            self.authorize(key)?;
        }

        let dataset = self.dataset(filename).await?;
        dataset.query(options)
    }

    pub async fn query(
        &self,
        filename: &str,
        api_key: Option<&str>,
        options: &QueryOptions,
    ) -> ApiResponse<QueryPage> {
        let result = self.get_file_contents(filename, api_key, options).await;
        if let Err(e) = &result {
            log::warn!("Vault query for {filename} failed: {e}");
        }
        result.into()
    }

    /// Flattens rows of every manifest file into lines of space-joined values.
    pub async fn context_rows(&self, limit: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for filename in MANIFEST {
            if lines.len() >= limit {
                break;
            }
            match self.dataset(filename).await {
                Ok(dataset) => {
                    for row in dataset.rows.iter().take(limit - lines.len()) {
                        let values: Vec<&str> = dataset
                            .headers
                            .iter()
                            .filter_map(|h| row.get(h).map(String::as_str))
                            .collect();
                        lines.push(values.join(" "));
                    }
                }
                Err(e) => log::warn!("Skipping {filename} in context export: {e}"),
            }
        }
        lines
    }

    // Rate limit first, then the key check.
    pub fn authorize(&self, api_key: &str) -> Result<(), VaultError> {
        self.admit()?;
        if !self.gate.validate(api_key) {
            return Err(VaultError::InvalidApiKey);
        }
        Ok(())
    }

    pub fn remaining_requests(&self) -> u32 {
        match self.limiter.lock() {
            Ok(limiter) => limiter.remaining(),
            Err(poisoned) => poisoned.into_inner().remaining(),
        }
    }

    fn admit(&self) -> Result<(), VaultError> {
        let mut limiter = match self.limiter.lock() {
            Ok(limiter) => limiter,
            Err(poisoned) => poisoned.into_inner(),
        };
        if limiter.try_acquire() {
            Ok(())
        } else {
            Err(VaultError::RateLimited {
                retry_in: limiter.time_until_reset(),
            })
        }
    }

    // Parsed once per file, shared afterwards.
    async fn dataset(&self, filename: &str) -> Result<Arc<Dataset>, VaultError> {
        if let Some(hit) = self.cached(filename) {
            return Ok(hit);
        }

        let source = self.source.clone();
        let name = filename.to_string();
        let parsed = tokio::task::spawn_blocking(move || {
            let bytes = source.read(&name)?;
            Dataset::parse(&name, &bytes)
        })
        .await
        .map_err(|e| VaultError::Io(std::io::Error::other(e)))??;

        let dataset = Arc::new(parsed);
        if let Ok(mut cache) = self.cache.lock() {
            cache
                .entry(filename.to_string())
                .or_insert_with(|| dataset.clone());
        }
        Ok(dataset)
    }

    fn cached(&self, filename: &str) -> Option<Arc<Dataset>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(filename).cloned())
    }
}
