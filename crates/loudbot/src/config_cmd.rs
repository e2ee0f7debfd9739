// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `loudbot config` subcommands.

use clap::Subcommand;
use loudbot_config::{LoudbotConfig, render_errors, validate_for_serve};
use loudbot_core::LoudbotError;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Check that the configuration is complete enough to serve.
    Validate,
}

/// Runs a config action against an already loaded configuration.
pub fn run_config(action: ConfigAction, config: &LoudbotConfig) -> Result<(), LoudbotError> {
    match action {
        ConfigAction::Show => {
            print!("{}", render_toml(config)?);
            Ok(())
        }
        ConfigAction::Validate => match validate_for_serve(config) {
            Ok(()) => {
                println!("configuration is valid");
                Ok(())
            }
            Err(errors) => {
                render_errors(&errors);
                Err(LoudbotError::Config(format!(
                    "{} configuration problem(s)",
                    errors.len()
                )))
            }
        },
    }
}

fn render_toml(config: &LoudbotConfig) -> Result<String, LoudbotError> {
    toml::to_string_pretty(config).map_err(|e| LoudbotError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shown_config_loads_back_identically() {
        let mut config = LoudbotConfig::default();
        config.irc.server = "irc.example.org".to_string();
        config.irc.channels = vec!["#bots".to_string()];

        let text = render_toml(&config).unwrap();
        assert!(text.contains("[storage]"));
        let reloaded = loudbot_config::load_and_validate_str(&text).unwrap();
        assert_eq!(reloaded.irc.server, "irc.example.org");
        assert_eq!(reloaded.irc.channels, vec!["#bots"]);
        assert_eq!(reloaded.storage.backend, config.storage.backend);
    }

    #[test]
    fn validate_rejects_missing_server() {
        let err = run_config(ConfigAction::Validate, &LoudbotConfig::default()).unwrap_err();
        assert!(matches!(err, LoudbotError::Config(_)));
    }

    #[test]
    fn validate_accepts_complete_config() {
        let mut config = LoudbotConfig::default();
        config.irc.server = "irc.example.org".to_string();
        run_config(ConfigAction::Validate, &config).unwrap();
    }
}
