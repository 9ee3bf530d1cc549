use crate::tmdb::TMDB_BASE;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LANGUAGE: &str = "fr-FR";
const DEFAULT_DATA_DIR: &str = ".cinefav";
const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub language: String,
    pub data_dir: PathBuf,
    pub debounce: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_api_key = get("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let debounce_ms = match get("CINEFAV_DEBOUNCE_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("CINEFAV_DEBOUNCE_MS is not a number: {raw}"))?,
            None => DEFAULT_DEBOUNCE_MS,
        };

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url: get("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string()),
            language: get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            data_dir: get("CINEFAV_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            debounce: Duration::from_millis(debounce_ms),
        })
    }
}
