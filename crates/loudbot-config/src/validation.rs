// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as channel name shapes, compilable ignore patterns and retrieval bounds.

use std::collections::HashSet;

use loudbot_core::BackendKind;

use crate::diagnostic::ConfigError;
use crate::model::LoudbotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LoudbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // irc.server may be empty here; `serve` checks it via validate_for_serve.
    let server = config.irc.server.trim();
    if !server.is_empty()
        && !server
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':')
    {
        errors.push(ConfigError::Validation {
            message: format!("irc.server `{server}` is not a valid hostname or IP address"),
        });
    }

    if config.irc.port == 0 {
        errors.push(ConfigError::Validation {
            message: "irc.port must be non-zero".to_string(),
        });
    }

    if !is_valid_nickname(&config.irc.nickname) {
        errors.push(ConfigError::Validation {
            message: format!(
                "irc.nickname `{}` must be non-empty and contain no spaces, commas or colons",
                config.irc.nickname
            ),
        });
    }

    let mut seen_channels = HashSet::new();
    for channel in &config.irc.channels {
        if !(channel.starts_with('#') || channel.starts_with('&')) || channel.contains(' ') {
            errors.push(ConfigError::Validation {
                message: format!("irc.channels entry `{channel}` must start with `#` or `&`"),
            });
        }
        if !seen_channels.insert(channel.to_lowercase()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate channel `{channel}` in irc.channels"),
            });
        }
    }

    if config.bot.heartbeat_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "bot.heartbeat_interval_secs must be at least 1".to_string(),
        });
    }

    if config.bot.command_prefix.is_empty() {
        errors.push(ConfigError::Validation {
            message: "bot.command_prefix must not be empty".to_string(),
        });
    }

    let patterns = [
        ("bot.ignore_patterns", &config.bot.ignore_patterns),
        ("bot.allow_patterns", &config.bot.allow_patterns),
    ];
    for (key, list) in patterns {
        for pattern in list {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(ConfigError::Validation {
                    message: format!("{key} entry `{pattern}` is not a valid regex: {e}"),
                });
            }
        }
    }

    for alias in &config.bot.aliases {
        if let Err(e) = regex::Regex::new(&alias.pattern) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "bot.aliases pattern `{}` is not a valid regex: {e}",
                    alias.pattern
                ),
            });
        }
        if alias.nick.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("bot.aliases nick for `{}` must not be empty", alias.pattern),
            });
        }
    }

    match config.storage.backend {
        BackendKind::FlatFile => {
            if config.storage.flat_file_path.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "storage.flat_file_path must not be empty".to_string(),
                });
            }
        }
        BackendKind::Sqlite => {
            if config.storage.database_path.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: "storage.database_path must not be empty".to_string(),
                });
            }
        }
    }

    if config.storage.min_retrieval_size == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.min_retrieval_size must be at least 1".to_string(),
        });
    }

    if config.storage.max_retrieval_factor == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.max_retrieval_factor must be at least 1".to_string(),
        });
    }

    if config.storage.io_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.io_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Extra checks that only matter when actually connecting to a network.
pub fn validate_for_serve(config: &LoudbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = match validate_config(config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config.irc.server.trim().is_empty() {
        errors.push(ConfigError::MissingKey {
            key: "irc.server".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_nickname(nick: &str) -> bool {
    !nick.is_empty()
        && !nick.starts_with(|c: char| c.is_ascii_digit() || c == '-')
        && !nick.contains([' ', ',', ':', '!', '@'])
}
