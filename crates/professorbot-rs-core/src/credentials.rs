//! API credential lookup.
//!
//! The secrets file (a JSON5 object keyed by credential name) is consulted
//! first, then the process environment. A missing credential is not an error:
//! the driver runs without a generator and substitutes a warning each turn.

use log::{debug, warn};
use professorbot_rs_config::CredentialsConfig;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Resolve the credential from the secrets file or the process environment.
pub fn resolve_api_key(config: &CredentialsConfig, cwd: &Path) -> Option<String> {
    resolve_api_key_with(config, cwd, |name| std::env::var(name).ok())
}

/// Same as [`resolve_api_key`] with an injectable environment lookup.
pub fn resolve_api_key_with<F>(config: &CredentialsConfig, cwd: &Path, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = config
        .secrets_path
        .as_ref()
        .and_then(|path| read_secret(&cwd.join(path), &config.env_var))
    {
        debug!("credential resolved from secrets file (key={})", config.env_var);
        return Some(key);
    }
    let key = env(&config.env_var).and_then(non_blank);
    if key.is_some() {
        debug!("credential resolved from environment (key={})", config.env_var);
    } else {
        debug!("credential not found (key={})", config.env_var);
    }
    key
}

fn read_secret(path: &Path, name: &str) -> Option<String> {
    if !path.exists() {
        debug!("secrets file missing (path={})", path.display());
        return None;
    }
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(
                "failed to read secrets file (path={}, err={})",
                path.display(),
                err
            );
            return None;
        }
    };
    let value: Value = match json5::from_str(&contents) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "failed to parse secrets file (path={}, err={})",
                path.display(),
                err
            );
            return None;
        }
    };
    value
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .and_then(non_blank)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
