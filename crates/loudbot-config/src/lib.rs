// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for loudbot.
//!
//! TOML files are merged over compiled defaults following the XDG
//! hierarchy, then `LOUDBOT_*` environment variables are applied. Unknown
//! keys are rejected and reported with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use loudbot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Connecting to {}", config.irc.server);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{build_figment, load_config, load_config_from_path, load_config_from_str};
pub use model::{AliasConfig, BotConfig, IrcConfig, LoudbotConfig, StorageConfig};
pub use validation::{validate_config, validate_for_serve};

/// Loads the layered configuration and validates it.
///
/// Figment failures come back as diagnostics carrying source spans for
/// whichever `loudbot.toml` files were read.
pub fn load_and_validate() -> Result<LoudbotConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(&standard_paths()),
        )),
    }
}

/// Loads one explicit file (plus env overrides) and validates it.
pub fn load_and_validate_from_path(path: &Path) -> Result<LoudbotConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(&[path.to_path_buf()]),
        )),
    }
}

/// Loads a TOML string over the defaults and validates it.
pub fn load_and_validate_str(toml_content: &str) -> Result<LoudbotConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Config file locations, lowest precedence first.
fn standard_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/loudbot/loudbot.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("loudbot/loudbot.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("loudbot.toml"));
    }
    paths
}

/// Reads whichever of `paths` exist, keyed by the display path Figment reports.
fn collect_toml_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            let key = std::fs::canonicalize(path)
                .unwrap_or_else(|_| path.clone())
                .display()
                .to_string();
            Some((key, content))
        })
        .collect()
}
