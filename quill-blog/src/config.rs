use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use quill_orm::PoolConfig;
use serde::Deserialize;
use serde_json::{Map, Value};

const DEFAULT_CONFIG: &str = include_str!("../config/default.json");
const OVERRIDE_PATH: &str = "config/override.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: PoolConfig,
    pub session: SessionConfig,
    pub static_dir: PathBuf,
    pub create_tables: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub cookie_name: String,
    /// Cookie lifetime in seconds.
    pub max_age: u64,
}

impl AppConfig {
    /// Loads the embedded defaults merged with the override file, if any.
    ///
    /// The override path comes from `QUILL_CONFIG` (a `.env` file is honoured),
    /// falling back to `config/override.json` when it exists.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let override_path = env::var("QUILL_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                let path = PathBuf::from(OVERRIDE_PATH);
                path.exists().then_some(path)
            });

        let override_text = match &override_path {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
            ),
            None => {
                tracing::warn!("no override configuration found, using defaults");
                None
            }
        };

        Self::from_json(DEFAULT_CONFIG, override_text.as_deref())
    }

    pub fn from_json(defaults: &str, override_text: Option<&str>) -> Result<Self> {
        let defaults: Value =
            serde_json::from_str(defaults).context("default configuration is not valid JSON")?;
        let merged = match override_text {
            Some(text) => {
                let overrides: Value = serde_json::from_str(text)
                    .context("override configuration is not valid JSON")?;
                merge_config(&defaults, &overrides)
            }
            None => defaults,
        };
        serde_json::from_value(merged).context("configuration has an unexpected shape")
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Overlays `overrides` on `defaults`.
///
/// Only keys present in `defaults` survive. Nested objects merge recursively;
/// any other value is replaced by the override.
pub fn merge_config(defaults: &Value, overrides: &Value) -> Value {
    let (Value::Object(defaults), Value::Object(overrides)) = (defaults, overrides) else {
        return defaults.clone();
    };

    let mut merged = Map::with_capacity(defaults.len());
    for (key, value) in defaults {
        let entry = match overrides.get(key) {
            Some(over) if value.is_object() => merge_config(value, over),
            Some(over) => over.clone(),
            None => value.clone(),
        };
        merged.insert(key.clone(), entry);
    }
    Value::Object(merged)
}
