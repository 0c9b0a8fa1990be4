// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./litebook.toml` > `~/.config/litebook/litebook.toml` > `/etc/litebook/litebook.toml`
//! with environment variable overrides via the `LITEBOOK_` prefix and the
//! legacy deployment variables `LOCAL_DB_PATH`, `GCS_DB_PATH` and `SYNC_INTERVAL_SEC`.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LitebookConfig;

/// Legacy variable names accepted without the `LITEBOOK_` prefix.
const LEGACY_KEYS: &[&str] = &["LOCAL_DB_PATH", "GCS_DB_PATH", "SYNC_INTERVAL_SEC"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/litebook/litebook.toml` (system-wide)
/// 3. `~/.config/litebook/litebook.toml` (user XDG config)
/// 4. `./litebook.toml` (local directory)
/// 5. Legacy environment variables
/// 6. `LITEBOOK_*` environment variables
pub fn load_config() -> Result<LitebookConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LitebookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LitebookConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LitebookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LitebookConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LitebookConfig::default()))
        .merge(Toml::file("/etc/litebook/litebook.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("litebook/litebook.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("litebook.toml"))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LITEBOOK_SYNC_INTERVAL_SECS` must map to `sync.interval_secs`,
/// not `sync.interval.secs`. Variables outside the known sections are ignored
/// so unrelated `LITEBOOK_*` variables cannot trip `deny_unknown_fields`.
fn env_provider() -> Env {
    Env::prefixed("LITEBOOK_")
        .filter(|key| {
            let key = key.as_str().to_ascii_lowercase();
            key == "db_name"
                || key.starts_with("storage_")
                || key.starts_with("sync_")
                || key.starts_with("daemon_")
        })
        .map(|key| {
            // `key` is the env var name with prefix stripped.
            // LITEBOOK_SYNC_REMOTE_PATH -> "sync_remote_path"
            let key_str = key.as_str().to_ascii_lowercase();
            if key_str == "db_name" {
                return "storage.database_name".into();
            }
            let mapped = key_str
                .replacen("storage_", "storage.", 1)
                .replacen("sync_", "sync.", 1)
                .replacen("daemon_", "daemon.", 1);
            mapped.into()
        })
}

/// Provider for the unprefixed variables older deployments set.
fn legacy_env_provider() -> Env {
    Env::raw().only(LEGACY_KEYS).map(|key| {
        match key.as_str().to_ascii_lowercase().as_str() {
            "local_db_path" => "storage.local_path".into(),
            "gcs_db_path" => "sync.remote_path".into(),
            "sync_interval_sec" => "sync.interval_secs".into(),
            other => other.to_string().into(),
        }
    })
}
