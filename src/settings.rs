// Runtime configuration, read once at startup from the environment (and `.env`).
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_VENICE_BASE_URL: &str = "https://api.venice.ai/api/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BLAND_BASE_URL: &str = "https://api.bland.ai/v1";
pub const DEFAULT_FROM_NUMBER: &str = "+15755000991";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub venice_api_key: String,
    pub venice_base_url: String,
    pub model: String,
    pub bland_api_key: String,
    pub bland_org_id: String,
    pub bland_base_url: String,
    pub bland_from_number: String,
    pub voice_disabled: bool,
    pub vault_passcode: String,
    pub data_dir: PathBuf,
    pub debug_mode: bool,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// What happened to the `.env` file. Reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    Loaded(PathBuf),
    Missing,
    Unreadable(String),
}

impl EnvFile {
    pub fn load() -> Self {
        Self::from_outcome(dotenvy::dotenv())
    }

    pub fn load_from(path: &Path) -> Self {
        Self::from_outcome(dotenvy::from_path(path).map(|()| path.to_path_buf()))
    }

    fn from_outcome(outcome: Result<PathBuf, dotenvy::Error>) -> Self {
        match outcome {
            Ok(path) => EnvFile::Loaded(path),
            Err(e) if e.not_found() => EnvFile::Missing,
            Err(e) => EnvFile::Unreadable(e.to_string()),
        }
    }

    pub fn log(&self) {
        match self {
            EnvFile::Loaded(path) => log::debug!("Loaded environment from {}", path.display()),
            EnvFile::Missing => {}
            EnvFile::Unreadable(e) => log::warn!("Ignoring unreadable .env file: {e}"),
        }
    }
}

impl Settings {
    // Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> (Self, EnvFile) {
        let env_file = EnvFile::load();
        (Self::from_lookup(|key| std::env::var(key).ok()), env_file)
    }

    /// Builds settings from an arbitrary variable lookup. Missing variables fall back to
    /// empty strings or the documented defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let or_default = |key: &str, default: &str| {
            let value = get(key);
            if value.is_empty() {
                default.to_string()
            } else {
                value
            }
        };

        let data_dir = match get("PROJECTX_DATA_DIR") {
            dir if !dir.is_empty() => PathBuf::from(dir),
            _ => default_data_dir(),
        };

        let request_timeout_secs = get("REQUEST_TIMEOUT_SECS")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Settings {
            venice_api_key: get("VENICE_API_KEY"),
            venice_base_url: or_default("VENICE_BASE_URL", DEFAULT_VENICE_BASE_URL),
            model: or_default("VENICE_MODEL", DEFAULT_MODEL),
            bland_api_key: get("BLAND_AI_KEY"),
            bland_org_id: get("BLAND_ORG_ID"),
            bland_base_url: or_default("BLAND_BASE_URL", DEFAULT_BLAND_BASE_URL),
            bland_from_number: or_default("BLAND_FROM_NUMBER", DEFAULT_FROM_NUMBER),
            voice_disabled: get("DISABLE_BLAND_AI").eq_ignore_ascii_case("true"),
            vault_passcode: get("VAULT_PASSCODE"),
            data_dir,
            debug_mode: is_truthy(&get("PROJECTX_DEBUG")),
            request_timeout_secs,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn completion_configured(&self) -> bool {
        !self.venice_api_key.is_empty()
    }

    pub fn voice_configured(&self) -> bool {
        !self.bland_api_key.is_empty() && !self.bland_org_id.is_empty()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn default_data_dir() -> PathBuf {
    dir::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("projectx")
        .join("data")
}
