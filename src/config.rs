use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::remote::Session;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "groupbook";

/// Environment variable that overrides `session_token` from the file.
pub const SESSION_TOKEN_ENV: &str = "GROUPBOOK_SESSION_TOKEN";

const DEFAULT_DB_SERVICE: &str = "db/_table";
const DEFAULT_FILE_CONTAINER: &str = "profile_images";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub base_url: String,
    pub api_key: String,
    pub session_token: Option<String>,
    pub db_service: String,
    pub file_container: String,
}

impl Config {
    /// Connection details for the fetch and delete calls.
    pub fn session(&self) -> Session {
        Session {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            session_token: self.session_token.clone(),
            db_service: self.db_service.clone(),
            file_container: self.file_container.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    base_url: Option<String>,
    api_key: Option<String>,
    session_token: Option<String>,
    db_service: Option<String>,
    file_container: Option<String>,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    let dir = base.config_dir().join(APP_NAME);
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load the configuration from `path`, or from the default location.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => expand_tilde(path),
        None => config_path()?,
    };
    if !path.exists() {
        bail!(
            "configuration file not found at {}. Please create it as per docs.",
            path.display()
        );
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let env_token = env::var(SESSION_TOKEN_ENV).ok();
    parse(&raw, path, env_token)
}

fn parse(raw: &str, path: PathBuf, env_token: Option<String>) -> Result<Config> {
    let value: toml::Value = toml::from_str(raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let base_url = non_empty(cfg_file.base_url)
        .ok_or_else(|| anyhow!("`base_url` must be specified in configuration"))?;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        bail!("`base_url` must start with http:// or https://, got {}", base_url);
    }

    let api_key = non_empty(cfg_file.api_key)
        .ok_or_else(|| anyhow!("`api_key` must be specified in configuration"))?;

    let session_token = non_empty(env_token).or_else(|| non_empty(cfg_file.session_token));

    Ok(Config {
        config_path: path,
        base_url: base_url.trim_end_matches('/').to_string(),
        api_key,
        session_token,
        db_service: non_empty(cfg_file.db_service).unwrap_or_else(|| DEFAULT_DB_SERVICE.into()),
        file_container: non_empty(cfg_file.file_container)
            .unwrap_or_else(|| DEFAULT_FILE_CONTAINER.into()),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from([
        "base_url",
        "api_key",
        "session_token",
        "db_service",
        "file_container",
    ]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            log::warn!("unknown configuration key `{}`", key);
        }
    }
}
