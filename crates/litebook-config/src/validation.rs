// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths and sidecar files that must not alias the database.

use crate::diagnostic::ConfigError;
use crate::model::LitebookConfig;

/// Upper bound for `sync.pause_timeout_ms`; writers should never stall longer.
const MAX_PAUSE_TIMEOUT_MS: u64 = 60_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LitebookConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_name must not be empty".to_string(),
        });
    }

    for (key, value) in [
        ("storage.local_path", &config.storage.local_path),
        ("sync.remote_path", &config.sync.remote_path),
        ("sync.checksum_path", &config.sync.checksum_path),
        ("sync.snapshot_path", &config.sync.snapshot_path),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty when set"),
            });
        }
    }

    let local = config.local_path();
    if local == config.remote_path() {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.remote_path must differ from the local database path `{}`",
                local.display()
            ),
        });
    }

    for (key, path) in [
        ("sync.checksum_path", config.checksum_path()),
        ("sync.snapshot_path", config.snapshot_path()),
    ] {
        if path == local || path == config.remote_path() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "{key} `{}` collides with a database path",
                    path.display()
                ),
            });
        }
    }

    if config.checksum_path() == config.snapshot_path() {
        errors.push(ConfigError::Validation {
            message: "sync.checksum_path and sync.snapshot_path must differ".to_string(),
        });
    }

    if config.sync.pause_timeout_ms > MAX_PAUSE_TIMEOUT_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "sync.pause_timeout_ms must be at most {MAX_PAUSE_TIMEOUT_MS}, got {}",
                config.sync.pause_timeout_ms
            ),
        });
    }

    if config.storage.session_wait_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.session_wait_secs must be at least 1".to_string(),
        });
    }

    let level = config.daemon.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level `{}` is not one of {}",
                config.daemon.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
