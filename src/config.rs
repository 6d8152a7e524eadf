use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const APP_DIR: &str = "expense-tracker";

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub session_file: PathBuf,
    pub log_file: PathBuf,
    pub timeout_secs: u64,
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return None;
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                None
            }
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `EXPENSE_TRACKER_*` variables.
    pub fn load() -> ApiResult<Self> {
        let file = config_path()
            .and_then(|p| FileConfig::load(&p))
            .unwrap_or_default();
        Self::resolve(file, |key| env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup.
    pub fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let api_url = var("EXPENSE_TRACKER_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_file = var("EXPENSE_TRACKER_SESSION_FILE")
            .map(PathBuf::from)
            .or(file.session_file)
            .unwrap_or_else(|| data_dir().join("session.json"));

        let log_file = var("EXPENSE_TRACKER_LOG_FILE")
            .map(PathBuf::from)
            .or(file.log_file)
            .unwrap_or_else(|| data_dir().join("expense-tracker.log"));

        let timeout_secs = match var("EXPENSE_TRACKER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ApiError::Config {
                message: format!("EXPENSE_TRACKER_TIMEOUT_SECS is not a number: {raw}"),
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url: normalize_base_url(&api_url)?,
            session_file,
            log_file,
            timeout_secs,
        })
    }

    pub fn with_api_url(mut self, url: &str) -> ApiResult<Self> {
        self.api_url = normalize_base_url(url)?;
        Ok(self)
    }
}

/// Parse a base URL and make sure it ends with `/`, so `Url::join("spends/")`
/// appends instead of replacing the last segment.
pub fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash).map_err(|e| ApiError::Config {
        message: format!("invalid API URL {trimmed:?}: {e}"),
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Config {
            message: format!("API URL must be http(s): {trimmed}"),
        });
    }
    Ok(url)
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("EXPENSE_TRACKER_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let cfg = Config::resolve(FileConfig::default(), env_of(&[])).unwrap();
        assert_eq!(cfg.api_url.as_str(), DEFAULT_API_URL);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(cfg.session_file.ends_with("expense-tracker/session.json"));
    }

    #[test]
    fn env_beats_file() {
        let file: FileConfig = toml::from_str(
            r#"
            api_url = "http://files.example/api"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        let cfg = Config::resolve(
            file,
            env_of(&[
                ("EXPENSE_TRACKER_API_URL", "https://env.example/v1"),
                ("EXPENSE_TRACKER_SESSION_FILE", "/tmp/s.json"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.api_url.as_str(), "https://env.example/v1/");
        assert_eq!(cfg.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = Config::resolve(
            FileConfig::default(),
            env_of(&[("EXPENSE_TRACKER_TIMEOUT_SECS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = normalize_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(url.join("spends/").unwrap().as_str(), "http://localhost:8000/api/spends/");

        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("ftp://host/api").is_err());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [").unwrap();
        assert!(FileConfig::load(&path).is_none());

        std::fs::write(&path, "timeout_secs = 5").unwrap();
        assert_eq!(FileConfig::load(&path).unwrap().timeout_secs, Some(5));
    }
}
