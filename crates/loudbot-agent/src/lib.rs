// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bot loop: chat events in, stored louds out.
//!
//! [`BotLoop`] owns the channel and the message store. It:
//! - drops lines from ignored senders, and from anyone off the allow list
//! - folds aliased handles into one author
//! - dispatches all-caps bang commands
//! - replays a stored message when addressed by nick
//! - stores and answers loud lines
//! - flushes the store on every heartbeat and once more at shutdown

pub mod classifier;
pub mod commands;
pub mod heartbeat;
pub mod shutdown;

use std::time::Duration;

use loudbot_config::model::LoudbotConfig;
use loudbot_core::{
    ChannelAdapter, ChannelEvent, InboundMessage, LoudbotError, OutboundMessage, PluginAdapter,
};
use loudbot_store::{MessageStore, VoteOutcome};
use regex::{Regex, RegexSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::commands::{Command, CommandName};

/// Reply when there is nothing stored to replay.
pub const EMPTY_STORE_REPLY: &str = "I DON'T KNOW ANYTHING LOUD YET. SHOUT AT ME.";

/// Connects a chat channel to a message store.
pub struct BotLoop {
    channel: Box<dyn ChannelAdapter>,
    store: MessageStore,
    classifier: Classifier,
    ignore: RegexSet,
    allow: RegexSet,
    /// Pattern and canonical nick; the last matching entry wins.
    aliases: Vec<(Regex, String)>,
    command_prefix: String,
    heartbeat_period: Duration,
    io_timeout: Duration,
    /// Text of the last replayed message; the target of votes and `!SCORE`.
    last_replayed: Option<String>,
}

impl BotLoop {
    /// Builds the loop from an already connected channel and a loaded store.
    ///
    /// Fails with [`LoudbotError::Config`] if an ignore, allow or alias
    /// pattern does not compile.
    pub fn new(
        channel: Box<dyn ChannelAdapter>,
        store: MessageStore,
        config: &LoudbotConfig,
    ) -> Result<Self, LoudbotError> {
        let ignore = RegexSet::new(&config.bot.ignore_patterns)
            .map_err(|e| LoudbotError::Config(format!("bot.ignore_patterns: {e}")))?;
        let allow = RegexSet::new(&config.bot.allow_patterns)
            .map_err(|e| LoudbotError::Config(format!("bot.allow_patterns: {e}")))?;
        let aliases = config
            .bot
            .aliases
            .iter()
            .map(|alias| {
                Regex::new(&alias.pattern)
                    .map(|re| (re, alias.nick.clone()))
                    .map_err(|e| LoudbotError::Config(format!("bot.aliases: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            nickname = channel.nickname(),
            messages = store.len(),
            ignore_patterns = ignore.len(),
            allow_patterns = allow.len(),
            aliases = aliases.len(),
            "bot loop initialized"
        );

        Ok(Self {
            channel,
            store,
            classifier: Classifier::new(&config.bot.blocked_words),
            ignore,
            allow,
            aliases,
            command_prefix: config.bot.command_prefix.clone(),
            heartbeat_period: Duration::from_secs(config.bot.heartbeat_interval_secs),
            io_timeout: Duration::from_secs(config.storage.io_timeout_secs),
            last_replayed: None,
        })
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn last_replayed(&self) -> Option<&str> {
        self.last_replayed.as_deref()
    }

    /// Runs until `cancel` fires or the connection drops.
    ///
    /// Either way the store gets a final flush, the channel is shut down and
    /// the backend closed. A dropped connection is returned as an error.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), LoudbotError> {
        info!("bot loop running");
        let mut ticker = heartbeat::interval(self.heartbeat_period);

        let outcome = loop {
            tokio::select! {
                event = self.channel.receive() => match event {
                    Ok(ChannelEvent::Disconnected { reason }) => {
                        warn!(%reason, "disconnected from server");
                        break Err(LoudbotError::Channel {
                            message: format!("disconnected: {reason}"),
                            source: None,
                        });
                    }
                    Ok(event) => self.handle_event(event).await,
                    Err(e) => {
                        error!(error = %e, "channel receive error");
                        break Err(e);
                    }
                },
                _ = ticker.tick() => heartbeat::beat(&mut self.store, self.io_timeout).await,
                () = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break Ok(());
                }
            }
        };

        self.finish().await;
        outcome
    }

    async fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => info!(nickname = self.channel.nickname(), "connected"),
            ChannelEvent::Joined { channel } => debug!(%channel, "joined channel"),
            ChannelEvent::Heartbeat => heartbeat::beat(&mut self.store, self.io_timeout).await,
            ChannelEvent::Message(msg) => {
                if let Err(e) = self.handle_message(msg).await {
                    error!(error = %e, "failed to handle message");
                }
            }
            ChannelEvent::Disconnected { .. } => {}
        }
    }

    /// Runs one chat line through the ignore and allow lists, aliasing,
    /// commands, the addressed check and the loudness check, stopping at the
    /// first that applies.
    pub async fn handle_message(&mut self, msg: InboundMessage) -> Result<(), LoudbotError> {
        let prefix = msg.sender.prefix();
        if self.ignore.is_match(&prefix) {
            debug!(sender = %prefix, "ignoring message from ignored sender");
            return Ok(());
        }
        if !self.allow.is_empty() && !self.allow.is_match(&prefix) {
            debug!(sender = %prefix, "ignoring message from sender not on the allow list");
            return Ok(());
        }
        // Replies still go to the real nick; only the stored author changes.
        let author = match self.alias_for(&prefix) {
            Some(nick) => {
                debug!(sender = %prefix, alias = nick, "sender is an alias");
                nick.to_string()
            }
            None => msg.sender.nick.clone(),
        };

        if let Some(command) = Command::parse(&msg.text, &self.command_prefix) {
            return self.run_command(command, &msg).await;
        }

        if msg.text.starts_with(self.channel.nickname()) {
            return self.replay(msg.reply_target()).await;
        }

        if msg.private || !self.classifier.is_loud(&msg.text) {
            return Ok(());
        }

        debug!(text = %msg.text, from = %author, "it was loud");
        if !self.store.exists(&msg.text).await? {
            match self.store.add(&msg.text, &author).await {
                Ok(_) | Err(LoudbotError::DuplicateKey { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        self.replay(msg.reply_target()).await
    }

    fn alias_for(&self, prefix: &str) -> Option<&str> {
        self.aliases
            .iter()
            .rev()
            .find(|(pattern, _)| pattern.is_match(prefix))
            .map(|(_, nick)| nick.as_str())
    }

    /// Sends the next message from the working set to `target`.
    async fn replay(&mut self, target: &str) -> Result<(), LoudbotError> {
        let text = match self.store.random() {
            Ok(message) => {
                let text = message.text().to_string();
                self.last_replayed = Some(text.clone());
                text
            }
            Err(LoudbotError::EmptyStore) => EMPTY_STORE_REPLY.to_string(),
            Err(e) => return Err(e),
        };
        self.channel.send(OutboundMessage::new(target, text)).await
    }

    async fn run_command(
        &mut self,
        command: Command,
        msg: &InboundMessage,
    ) -> Result<(), LoudbotError> {
        let (name, args) = match command {
            Command::Known { name, args } => (name, args),
            Command::Unknown(name) => {
                debug!(command = %name, "unknown command");
                return Ok(());
            }
        };
        debug!(command = %name, from = %msg.sender.nick, "command");

        let reply = match name {
            CommandName::Upvote => {
                self.vote(MessageStore::upvote)?;
                return Ok(());
            }
            CommandName::Downvote => {
                self.vote(MessageStore::downvote)?;
                return Ok(());
            }
            CommandName::Score => self.score_text(),
            CommandName::Help => commands::help_text(&self.command_prefix, &args),
        };
        self.channel
            .send(OutboundMessage::new(msg.reply_target(), reply))
            .await
    }

    fn vote(
        &mut self,
        apply: fn(&mut MessageStore, &str) -> Result<VoteOutcome, LoudbotError>,
    ) -> Result<(), LoudbotError> {
        let Some(text) = self.last_replayed.clone() else {
            debug!("vote with nothing to vote on");
            return Ok(());
        };
        match apply(&mut self.store, &text) {
            Ok(VoteOutcome::Updated(message)) => {
                debug!(text = message.text(), score = message.score(), "vote recorded");
            }
            Ok(VoteOutcome::Deleted(_)) | Err(LoudbotError::UnknownMessage { .. }) => {
                self.last_replayed = None;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn score_text(&self) -> String {
        match self.last_replayed.as_deref().and_then(|t| self.store.get(t)) {
            Some(message) => format!("{}: {}", message.text(), message.score()),
            None => format!(
                "NO LAST MESSAGE OR IT WAS DELETED BY {}DOWNVOTE",
                self.command_prefix
            ),
        }
    }

    async fn finish(&mut self) {
        match heartbeat::flush_with_timeout(&mut self.store, self.io_timeout).await {
            Ok(_) => {}
            Err(e) => error!(error = %e, "final flush failed, unsaved changes are lost"),
        }
        if let Err(e) = self.channel.shutdown().await {
            warn!(error = %e, "channel shutdown failed");
        }
        if let Err(e) = self.store.close().await {
            warn!(error = %e, "closing storage failed");
        }
        info!("bot loop stopped");
    }
}
