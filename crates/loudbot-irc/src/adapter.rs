// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! IRC implementation of [`ChannelAdapter`].

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use irc::client::data::Config;
use irc::client::{Client, ClientStream, Sender as IrcSender};
use irc::proto::{Command, Message, Prefix, Response};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use loudbot_config::model::IrcConfig;
use loudbot_core::{
    AdapterType, ChannelAdapter, ChannelEvent, HealthStatus, InboundMessage, LoudbotError,
    OutboundMessage, PluginAdapter, Sender,
};

/// How long `connect` waits for the TCP (and TLS) handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long shutdown keeps the connection alive for QUIT to go out.
const QUIT_TIMEOUT: Duration = Duration::from_secs(5);

const QUIT_REASON: &str = "LOUDBOT OUT";

/// Fallback nicknames tried in order when the configured one is taken.
const ALT_NICKS: usize = 3;

/// An IRC connection driven by the bot loop.
///
/// The `irc` client answers PINGs, joins the configured channels after the
/// MOTD and walks the alternate nicknames on its own. Everything it hands
/// back is mapped to [`ChannelEvent`]s here. Outgoing lines sit in the
/// client's queue and are written while the stream is polled, so the bot
/// loop keeps [`ChannelAdapter::receive`] pending between events.
pub struct IrcChannel {
    config: IrcConfig,
    nickname: String,
    sender: Option<IrcSender>,
    stream: Mutex<Option<ClientStream>>,
}

impl IrcChannel {
    /// Not connected until [`ChannelAdapter::connect`].
    pub fn new(config: IrcConfig) -> Self {
        let nickname = config.nickname.clone();
        Self {
            config,
            nickname,
            sender: None,
            stream: Mutex::new(None),
        }
    }

    fn client_config(&self) -> Config {
        Config {
            nickname: Some(self.config.nickname.clone()),
            alt_nicks: (1..=ALT_NICKS)
                .map(|n| format!("{}{}", self.config.nickname, "_".repeat(n)))
                .collect(),
            username: Some(self.config.username.clone()),
            realname: Some(self.config.realname.clone()),
            server: Some(self.config.server.clone()),
            port: Some(self.config.port),
            use_tls: Some(self.config.use_tls),
            channels: self.config.channels.clone(),
            ..Config::default()
        }
    }

    fn queue(&self, command: Command) -> Result<(), LoudbotError> {
        let sender = self.sender.as_ref().ok_or_else(not_connected)?;
        sender.send(command).map_err(|e| LoudbotError::Channel {
            message: "connection writer has stopped".to_string(),
            source: Some(Box::new(e)),
        })
    }

    fn is_own_nick(&self, nick: &str) -> bool {
        nick.eq_ignore_ascii_case(&self.nickname)
    }

    /// Reacts to one protocol message; `None` means nothing for the bot loop.
    ///
    /// Never awaits: replies only go onto the client's queue, so a caller
    /// that drops `receive` mid-way cannot lose them.
    fn handle(&mut self, msg: Message) -> Result<Option<ChannelEvent>, LoudbotError> {
        let source = msg.source_nickname().map(str::to_string);
        match msg.command {
            // The client has already queued the PONG.
            Command::PING(..) => Ok(Some(ChannelEvent::Heartbeat)),
            Command::Response(Response::RPL_WELCOME, args) => {
                if let Some(nick) = args.first() {
                    self.nickname = nick.clone();
                }
                info!(nickname = %self.nickname, "registered with server");
                Ok(Some(ChannelEvent::Connected))
            }
            Command::NICK(new) => {
                if source.as_deref().is_some_and(|nick| self.is_own_nick(nick)) {
                    info!(nickname = %new, "nickname changed");
                    self.nickname = new;
                }
                Ok(None)
            }
            Command::INVITE(_, channel) => {
                info!(%channel, "invited, joining");
                self.queue(Command::JOIN(channel, None, None))?;
                Ok(None)
            }
            Command::JOIN(channel, _, _) => {
                if !source.as_deref().is_some_and(|nick| self.is_own_nick(nick)) {
                    return Ok(None);
                }
                info!(%channel, "joined");
                if let Some(greeting) = self.config.join_greeting.clone() {
                    if !greeting.is_empty() {
                        self.queue(Command::PRIVMSG(channel.clone(), greeting))?;
                    }
                }
                Ok(Some(ChannelEvent::Joined { channel }))
            }
            Command::PRIVMSG(target, text) => {
                let Some(sender) = msg.prefix.as_ref().map(sender_of) else {
                    return Ok(None);
                };
                // CTCP (ACTION, VERSION, ...) is not chat.
                if text.starts_with('\u{1}') {
                    debug!(from = %sender.nick, "ignoring CTCP");
                    return Ok(None);
                }
                let private = self.is_own_nick(&target);
                Ok(Some(ChannelEvent::Message(InboundMessage {
                    sender,
                    target,
                    text,
                    private,
                })))
            }
            Command::ERROR(reason) => {
                warn!(%reason, "server error");
                Ok(Some(ChannelEvent::Disconnected { reason }))
            }
            _ => Ok(None),
        }
    }
}

fn not_connected() -> LoudbotError {
    LoudbotError::Channel {
        message: "not connected".to_string(),
        source: None,
    }
}

fn sender_of(prefix: &Prefix) -> Sender {
    let part = |s: &String| (!s.is_empty()).then(|| s.clone());
    match prefix {
        Prefix::Nickname(nick, user, host) => Sender {
            nick: nick.clone(),
            user: part(user),
            host: part(host),
        },
        Prefix::ServerName(name) => Sender {
            nick: name.clone(),
            user: None,
            host: None,
        },
    }
}

#[async_trait]
impl PluginAdapter for IrcChannel {
    fn name(&self) -> &str {
        "irc"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, LoudbotError> {
        if self.sender.is_none() || self.stream.lock().await.is_none() {
            return Ok(HealthStatus::Unhealthy("not connected".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }

    /// Sends QUIT and keeps polling until the server hangs up or time runs out.
    async fn shutdown(&self) -> Result<(), LoudbotError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };
        if let Err(e) = self.queue(Command::QUIT(Some(QUIT_REASON.to_string()))) {
            debug!(error = %e, "QUIT not queued");
            return Ok(());
        }
        let drained = tokio::time::timeout(QUIT_TIMEOUT, async {
            while let Some(next) = stream.next().await {
                if let Err(e) = next {
                    debug!(error = %e, "connection error while quitting");
                    break;
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!("timed out waiting for the server to close after QUIT");
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for IrcChannel {
    async fn connect(&mut self) -> Result<(), LoudbotError> {
        let server = format!("{}:{}", self.config.server, self.config.port);
        let connecting = Client::from_config(self.client_config());
        let mut client = tokio::time::timeout(CONNECT_TIMEOUT, connecting)
            .await
            .map_err(|_| LoudbotError::Channel {
                message: format!("timed out connecting to {server}"),
                source: None,
            })?
            .map_err(|e| LoudbotError::Channel {
                message: format!("cannot connect to {server}"),
                source: Some(Box::new(e)),
            })?;

        client.identify().map_err(|e| LoudbotError::Channel {
            message: "registration failed".to_string(),
            source: Some(Box::new(e)),
        })?;
        let stream = client.stream().map_err(|e| LoudbotError::Channel {
            message: "connection stream unavailable".to_string(),
            source: Some(Box::new(e)),
        })?;

        info!(%server, tls = self.config.use_tls, "connected");
        self.nickname = self.config.nickname.clone();
        self.sender = Some(client.sender());
        *self.stream.get_mut() = Some(stream);
        Ok(())
    }

    /// Queues one PRIVMSG per non-empty line of `msg.text`.
    async fn send(&self, msg: OutboundMessage) -> Result<(), LoudbotError> {
        for line in msg.text.lines().filter(|l| !l.is_empty()) {
            self.queue(Command::PRIVMSG(msg.target.clone(), line.to_string()))?;
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<ChannelEvent, LoudbotError> {
        loop {
            let stream = self.stream.get_mut().as_mut().ok_or_else(not_connected)?;
            let next = stream.next().await;
            let msg = match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    warn!(error = %e, "connection failed");
                    *self.stream.get_mut() = None;
                    return Ok(ChannelEvent::Disconnected {
                        reason: e.to_string(),
                    });
                }
                None => {
                    *self.stream.get_mut() = None;
                    return Ok(ChannelEvent::Disconnected {
                        reason: "connection closed".to_string(),
                    });
                }
            };
            if let Some(event) = self.handle(msg)? {
                return Ok(event);
            }
        }
    }

    fn nickname(&self) -> &str {
        &self.nickname
    }
}
