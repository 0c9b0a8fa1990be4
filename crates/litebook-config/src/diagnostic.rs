// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning figment errors into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint (Jaro-Winkler via `strsim`) and,
//! when the key can be found in one of the TOML sources, a label pointing at
//! it. Validation failures use the same type so everything renders alike.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Name under which inline TOML strings are passed as a source.
pub const INLINE_SOURCE: &str = "<inline>";

/// Scores at or below this are too far off to suggest.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(litebook::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[sync]`, `[storage]`, ... or `the top level`.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// Wrong type, or a value outside the accepted set (e.g. a checkpoint mode).
    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(litebook::config::invalid_value), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(litebook::config::missing_key),
        help("set `{key}` in litebook.toml or the environment")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense (see [`crate::validation`]).
    #[error("validation error: {message}")]
    #[diagnostic(code(litebook::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(litebook::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error contained in `err`.
///
/// `sources` are `(name, content)` pairs of the TOML inputs, used to attach
/// source spans. Files are named by path; inline strings by [`INLINE_SOURCE`].
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|e| convert(&e, sources)).collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    let path: Vec<String> = error.path.iter().map(|p| p.to_string()).collect();

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate(error, sources, &path, field).unzip();
            ConfigError::UnknownKey {
                key: field.clone(),
                section: describe_section(&path),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::UnknownVariant(found, variants) => {
            let (section, leaf) = split_leaf(&path);
            let (span, src) = locate(error, sources, section, leaf).unzip();
            ConfigError::InvalidType {
                key: path.join("."),
                detail: format!("`{found}` is not an accepted value"),
                expected: format!("one of: {}", variants.join(", ")),
                span,
                src,
            }
        }
        Kind::InvalidType(actual, expected) | Kind::InvalidValue(actual, expected) => {
            let (section, leaf) = split_leaf(&path);
            let (span, src) = locate(error, sources, section, leaf).unzip();
            ConfigError::InvalidType {
                key: path.join("."),
                detail: format!("found {actual}"),
                expected: expected.clone(),
                span,
                src,
            }
        }
        Kind::MissingField(field) => {
            let mut key = path.clone();
            key.push(field.to_string());
            ConfigError::MissingKey { key: key.join(".") }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

fn describe_section(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

/// `["sync", "final_mode"]` -> (`["sync"]`, `"final_mode"`).
fn split_leaf(path: &[String]) -> (&[String], &str) {
    match path.split_last() {
        Some((leaf, section)) => (section, leaf.as_str()),
        None => (&[], ""),
    }
}

/// Find `key` under `section` in the source the error came from.
///
/// When figment does not attribute the value to a file (inline strings,
/// merged tables), every source is tried in order.
fn locate(
    error: &figment::Error,
    sources: &[(String, String)],
    section: &[String],
    key: &str,
) -> Option<(SourceSpan, NamedSource<String>)> {
    if key.is_empty() {
        return None;
    }
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.as_path()),
            _ => None,
        });

    let candidates = sources
        .iter()
        .filter(|(name, _)| origin.is_none_or(|path| Path::new(name) == path));

    for (name, content) in candidates {
        if let Some(offset) = find_key_offset(content, section, key) {
            let span = SourceSpan::new(offset.into(), key.len());
            return Some((span, NamedSource::new(name, content.clone())));
        }
    }
    None
}

/// Byte offset of `key = ...` inside the `[section]` table of `content`.
///
/// An empty `section` means keys before the first table header.
pub fn find_key_offset(content: &str, section: &[String], key: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .trim_end_matches(']')
                .split('.')
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(".");
        } else if current == wanted {
            let is_key = trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// The valid key closest to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error) {
            Ok(()) => out.push_str(&rendered),
            Err(_) => out.push_str(&format!("error: {error}\n")),
        }
    }
    eprint!("{out}");
}
