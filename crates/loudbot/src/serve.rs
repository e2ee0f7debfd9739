// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `loudbot serve` command implementation.
//!
//! Opens the configured storage backend, loads the message store, connects
//! to IRC and hands everything to the bot loop until a signal arrives or the
//! connection drops.

use clap::Args;
use loudbot_agent::{BotLoop, shutdown};
use loudbot_config::LoudbotConfig;
use loudbot_core::{ChannelAdapter, LoudbotError, MessageBackend, PluginAdapter};
use loudbot_irc::IrcChannel;
use loudbot_store::{MessageStore, StoreOptions};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

/// Command-line overrides for `serve`. They win over every config layer.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// IRC server to connect to.
    #[arg(long, value_name = "HOST")]
    pub network: Option<String>,

    /// Channel to join; repeat for several. Replaces `irc.channels`.
    #[arg(long = "channel", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// Nickname to use.
    #[arg(long)]
    pub nick: Option<String>,

    /// Server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Connect over TLS.
    #[arg(long)]
    pub ssl: bool,

    /// Log at debug level.
    #[arg(long)]
    pub debug: bool,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut LoudbotConfig) {
        if let Some(network) = &self.network {
            config.irc.server = network.clone();
        }
        if !self.channels.is_empty() {
            config.irc.channels = self.channels.clone();
        }
        if let Some(nick) = &self.nick {
            config.irc.nickname = nick.clone();
        }
        if let Some(port) = self.port {
            config.irc.port = port;
        }
        if self.ssl {
            config.irc.use_tls = true;
        }
        if self.debug {
            config.bot.log_level = "debug".to_string();
        }
    }
}

/// Runs the `loudbot serve` command.
pub async fn run_serve(config: LoudbotConfig) -> Result<(), LoudbotError> {
    init_tracing(&config.bot.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting loudbot serve");

    let backend = loudbot_storage::open_backend(&config.storage);
    backend.initialize().await?;
    info!(backend = backend.name(), "storage initialized");

    let options = StoreOptions {
        deletion_floor: config.storage.deletion_floor,
    };
    let store = MessageStore::load(backend, options, StdRng::from_entropy()).await?;

    let mut channel = IrcChannel::new(config.irc.clone());
    if let Err(e) = channel.connect().await {
        if let Err(close_err) = store.close().await {
            warn!(error = %close_err, "closing storage failed");
        }
        return Err(e);
    }
    info!(
        server = %config.irc.server,
        port = config.irc.port,
        tls = config.irc.use_tls,
        "connected to IRC"
    );

    let cancel = shutdown::install_signal_handler();
    let mut bot = BotLoop::new(Box::new(channel), store, &config)?;
    bot.run(cancel).await?;

    info!("loudbot serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("loudbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_change_nothing() {
        let mut config = LoudbotConfig::default();
        config.irc.channels = vec!["#kept".to_string()];
        ServeArgs::default().apply(&mut config);
        assert_eq!(config.irc.channels, vec!["#kept"]);
        assert_eq!(config.irc.port, 6667);
        assert!(!config.irc.use_tls);
        assert_eq!(config.bot.log_level, "info");
    }

    #[test]
    fn flags_override_config() {
        let mut config = LoudbotConfig::default();
        config.irc.channels = vec!["#replaced".to_string()];
        let args = ServeArgs {
            network: Some("irc.example.org".to_string()),
            channels: vec!["#bots".to_string(), "#ngs".to_string()],
            nick: Some("LOUDER".to_string()),
            port: Some(6697),
            ssl: true,
            debug: true,
        };
        args.apply(&mut config);

        assert_eq!(config.irc.server, "irc.example.org");
        assert_eq!(config.irc.channels, vec!["#bots", "#ngs"]);
        assert_eq!(config.irc.nickname, "LOUDER");
        assert_eq!(config.irc.port, 6697);
        assert!(config.irc.use_tls);
        assert_eq!(config.bot.log_level, "debug");
    }

    #[test]
    fn overridden_config_is_servable() {
        let mut config = LoudbotConfig::default();
        assert!(loudbot_config::validate_for_serve(&config).is_err());
        ServeArgs {
            network: Some("irc.example.org".to_string()),
            ..ServeArgs::default()
        }
        .apply(&mut config);
        assert!(loudbot_config::validate_for_serve(&config).is_ok());
    }
}
