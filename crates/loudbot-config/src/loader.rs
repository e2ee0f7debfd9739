// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./loudbot.toml` > `~/.config/loudbot/loudbot.toml` > `/etc/loudbot/loudbot.toml`
//! with environment variable overrides via `LOUDBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::LoudbotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/loudbot/loudbot.toml` (system-wide)
/// 3. `~/.config/loudbot/loudbot.toml` (user XDG config)
/// 4. `./loudbot.toml` (local directory)
/// 5. `LOUDBOT_*` environment variables
pub fn load_config() -> Result<LoudbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<LoudbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LoudbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LoudbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LoudbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can layer CLI overrides on top.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LoudbotConfig::default()))
        .merge(Toml::file("/etc/loudbot/loudbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("loudbot/loudbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("loudbot.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `LOUDBOT_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("LOUDBOT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("irc_", "irc.", 1)
            .replacen("bot_", "bot.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
