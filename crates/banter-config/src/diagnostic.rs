// SPDX-FileCopyrightText: 2026 Banter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! valid key listings and "did you mean?" suggestions using Jaro-Winkler
//! string similarity.

use figment::error::Kind;
use miette::Diagnostic;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
/// 0.75 catches common typos like `hots` -> `host` or
/// `conccurency` -> `concurrency` while filtering noise.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with diagnostic information.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(banter::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(banter::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// The key with the wrong type.
        key: String,
        /// Description of the type mismatch.
        detail: String,
        /// What type was expected.
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(banter::config::missing_key),
        help("add `{key} = <value>` to your banter.toml")
    )]
    MissingKey {
        /// The missing key name.
        key: String,
    },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(banter::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(banter::config::other))]
    Other(String),
}

/// Format the help message for unknown key errors.
fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Suggest the closest valid key for a typo, if any scores above the
/// similarity threshold.
pub fn suggest_key(key: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (*c, strsim::jaro_winkler(key, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.to_string())
}

/// Convert a Figment extraction error into diagnostic errors.
///
/// Figment collects multiple deserialization failures into one error;
/// each is converted independently.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter().map(single_error_to_diagnostic).collect()
}

fn single_error_to_diagnostic(err: figment::Error) -> ConfigError {
    let rendered = err.to_string();
    let path = err.path.join(".");

    match &err.kind {
        Kind::UnknownField(field, expected) => {
            let key = if path.is_empty() {
                field.clone()
            } else {
                format!("{path}.{field}")
            };
            ConfigError::UnknownKey {
                key,
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
            }
        }
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: path,
            detail: format!("found {actual}"),
            expected: expected.clone(),
        },
        Kind::MissingField(name) => {
            let key = if path.is_empty() {
                name.to_string()
            } else {
                format!("{path}.{name}")
            };
            ConfigError::MissingKey { key }
        }
        _ => ConfigError::Other(rendered),
    }
}

/// Render configuration errors to stderr as miette reports.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_key_catches_close_typo() {
        let candidates = ["host", "port", "bearer_token", "log_level"];
        assert_eq!(suggest_key("hots", &candidates).as_deref(), Some("host"));
        assert_eq!(
            suggest_key("bearer_tokne", &candidates).as_deref(),
            Some("bearer_token")
        );
    }

    #[test]
    fn suggest_key_rejects_distant_strings() {
        let candidates = ["host", "port"];
        assert!(suggest_key("zzzzzz", &candidates).is_none());
    }

    #[test]
    fn unknown_key_help_mentions_suggestion() {
        let help = format_unknown_key_help(Some("host"), "host, port");
        assert!(help.contains("did you mean `host`?"));
    }

    #[test]
    fn figment_unknown_field_maps_to_unknown_key() {
        let err = crate::loader::load_config_from_str("[server]\nhots = \"x\"\n")
            .expect_err("unknown field should fail");
        let diags = figment_to_config_errors(err);
        assert!(!diags.is_empty());
        assert!(diags.iter().any(|d| matches!(
            d,
            ConfigError::UnknownKey { key, .. } if key.contains("hots")
        )));
    }
}
