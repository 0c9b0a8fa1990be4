// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for Litebook.
//!
//! Defaults, TOML files and environment variables are merged by figment
//! ([`loader`]), deserialized into [`LitebookConfig`] with unknown keys
//! rejected, then checked for cross-field consistency ([`validation`]).
//! Every failure comes back as a [`ConfigError`] ready for miette.
//!
//! ```no_run
//! let config = litebook_config::load_and_validate().unwrap_or_else(|errors| {
//!     litebook_config::render_errors(&errors);
//!     std::process::exit(1);
//! });
//! println!("mirror: {}", config.remote_path().display());
//! ```

use std::path::{Path, PathBuf};

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::LitebookConfig;

/// Load from the standard file locations and the environment, then validate.
pub fn load_and_validate() -> Result<LitebookConfig, Vec<ConfigError>> {
    checked(loader::load_config(), default_sources)
}

/// Load from one file (plus the environment), then validate.
pub fn load_and_validate_path(path: &Path) -> Result<LitebookConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_sources([path.to_path_buf()])
    })
}

/// Load from a TOML string alone, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<LitebookConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![(
            diagnostic::INLINE_SOURCE.to_string(),
            toml_content.to_string(),
        )]
    })
}

/// Validate a loaded config, or convert the load error. Sources are only
/// read when there is an error to annotate.
fn checked(
    loaded: Result<LitebookConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<LitebookConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// The files [`loader::build_figment`] reads, in merge order.
fn default_sources() -> Vec<(String, String)> {
    let mut candidates = vec![PathBuf::from("/etc/litebook/litebook.toml")];
    candidates.extend(dirs::config_dir().map(|d| d.join("litebook/litebook.toml")));
    candidates.extend(std::env::current_dir().ok().map(|d| d.join("litebook.toml")));
    read_sources(candidates)
}

fn read_sources(paths: impl IntoIterator<Item = PathBuf>) -> Vec<(String, String)> {
    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
