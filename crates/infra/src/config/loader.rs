//! Settings loader
//!
//! ## Loading Strategy
//! 1. Read the `AURA_*` environment variables
//! 2. If a required one is missing, fall back to a config file
//! 3. Probe the working directory and its parents for the file
//!
//! ## Environment Variables
//! - `AURA_CLIENT_ID`: OAuth client id (required)
//! - `AURA_CLIENT_SECRET`: OAuth client secret (required)
//! - `AURA_TENANT_ID`: tenant new instances are created in (required)
//! - `AURA_ENDPOINT`: API base URL
//! - `AURA_API_VERSION`: API version segment
//! - `AURA_RETRIES`: retries for 5xx responses and transport failures
//! - `AURA_REQUEST_TIMEOUT_SECS`: per-request timeout of the default transport
//!
//! ## File Locations
//! `aura.json`, `aura.toml`, `config.json` and `config.toml`, looked up in
//! the current directory, then up to two parent directories, then next to
//! the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use aura_domain::{AuraError, ClientSettings, Result};

const FILE_NAMES: [&str; 4] = ["aura.json", "aura.toml", "config.json", "config.toml"];

/// Load settings from the environment, falling back to a config file.
///
/// # Errors
/// Returns `AuraError::Config` if neither source yields valid settings.
pub fn load() -> Result<ClientSettings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Aura client settings loaded from environment variables");
            Ok(settings)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load settings from `AURA_*` environment variables.
///
/// # Errors
/// Returns `AuraError::Config` if a required variable is missing or an
/// optional one has an invalid value.
pub fn load_from_env() -> Result<ClientSettings> {
    let mut settings = ClientSettings::new(
        env_var("AURA_CLIENT_ID")?,
        env_var("AURA_CLIENT_SECRET")?,
        env_var("AURA_TENANT_ID")?,
    );

    if let Some(endpoint) = optional_env("AURA_ENDPOINT") {
        settings.endpoint = endpoint;
    }
    if let Some(version) = optional_env("AURA_API_VERSION") {
        settings.version = version;
    }
    if let Some(retries) = env_parse::<u32>("AURA_RETRIES")? {
        settings.retries = retries;
    }
    if let Some(timeout) = env_parse::<u64>("AURA_REQUEST_TIMEOUT_SECS")? {
        settings.request_timeout_secs = timeout;
    }

    Ok(settings)
}

/// Load settings from a file.
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). JSON and TOML are supported, chosen by file
/// extension.
///
/// # Errors
/// Returns `AuraError::Config` if the file is missing, unreadable, or has
/// invalid content.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientSettings> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuraError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuraError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading Aura client settings from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AuraError::Config(format!("Failed to read config file: {e}")))?;

    parse_settings(&contents, &config_path)
}

fn parse_settings(contents: &str, path: &Path) -> Result<ClientSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuraError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuraError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AuraError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Return the first existing settings file in the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| {
        AuraError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty value of `key`, if set.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AuraError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
