// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loudbot - AN IRC BOT THAT ONLY LISTENS TO SHOUTING.
//!
//! This is the binary entry point.

mod config_cmd;
mod serve;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config_cmd::ConfigAction;
use crate::serve::ServeArgs;

/// Loudbot - remembers what people shout and shouts it back.
#[derive(Parser, Debug)]
#[command(name = "loudbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to IRC and start listening.
    Serve(ServeArgs),
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => loudbot_config::load_and_validate_from_path(path),
        None => loudbot_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            loudbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve(args)) => {
            args.apply(&mut config);
            if let Err(errors) = loudbot_config::validate_for_serve(&config) {
                loudbot_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => {
            if let Err(e) = config_cmd::run_config(action, &config) {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("loudbot: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc can advance the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "loudbot",
            "serve",
            "--network",
            "irc.example.org",
            "--channel",
            "#bots",
            "--channel",
            "#ngs",
            "--nick",
            "LOUDER",
            "--port",
            "6697",
            "--ssl",
            "--debug",
        ])
        .unwrap();

        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.network.as_deref(), Some("irc.example.org"));
        assert_eq!(args.channels, vec!["#bots", "#ngs"]);
        assert_eq!(args.nick.as_deref(), Some("LOUDER"));
        assert_eq!(args.port, Some(6697));
        assert!(args.ssl);
        assert!(args.debug);
    }

    #[test]
    fn config_path_is_global() {
        let cli = Cli::try_parse_from(["loudbot", "config", "show", "--config", "/tmp/l.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/l.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(Cli::try_parse_from(["loudbot", "serve", "--port", "99999"]).is_err());
    }
}
