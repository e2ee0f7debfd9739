// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store, the storage backends and the channel adapters.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Score given to a freshly stored message.
pub const INITIAL_SCORE: i64 = 1;

/// Plain attribute bundle for one stored message.
///
/// This is what crosses the backend boundary: backends read and write
/// records, the store turns them into live messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Backend-assigned row identity. Only the SQLite backend sets this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default)]
    pub views: u64,
}

fn default_score() -> i64 {
    INITIAL_SCORE
}

impl MessageRecord {
    /// A never-persisted record with the initial score and no views.
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            author: author.into(),
            score: INITIAL_SCORE,
            views: 0,
        }
    }
}

/// Everything a flush hands to a backend.
///
/// Whole-file backends serialize `all`; row backends insert `inserted`
/// and update `updated`. `updated` may contain records that were just
/// deleted from memory so their final score reaches durable storage.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub all: Vec<MessageRecord>,
    pub inserted: Vec<MessageRecord>,
    pub updated: Vec<MessageRecord>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.inserted.is_empty() && self.updated.is_empty()
    }
}

/// Identity assigned by a backend to a newly inserted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedId {
    pub text: String,
    pub id: i64,
}

/// Which storage backend holds the durable message set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendKind {
    /// Whole set serialized to one file on every flush.
    FlatFile,
    /// SQLite table with partial writes and weighted retrieval.
    Sqlite,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Channel types ---

/// Who sent an inbound message, split from an IRC-style `nick!user@host` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub nick: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl Sender {
    /// Parses `nick!user@host`; missing parts are `None`.
    pub fn from_prefix(prefix: &str) -> Self {
        let (nick, rest) = match prefix.split_once('!') {
            Some((nick, rest)) => (nick, Some(rest)),
            None => (prefix, None),
        };
        let (user, host) = match rest {
            Some(rest) => match rest.split_once('@') {
                Some((user, host)) => (Some(user.to_string()), Some(host.to_string())),
                None => (Some(rest.to_string()), None),
            },
            None => match nick.split_once('@') {
                Some((_, host)) => (None, Some(host.to_string())),
                None => (None, None),
            },
        };
        let nick = nick.split('@').next().unwrap_or(nick);
        Self {
            nick: nick.to_string(),
            user,
            host,
        }
    }

    /// Renders the full `nick!user@host` form used by ignore patterns.
    pub fn prefix(&self) -> String {
        let mut out = self.nick.clone();
        if let Some(user) = &self.user {
            out.push('!');
            out.push_str(user);
        }
        if let Some(host) = &self.host {
            out.push('@');
            out.push_str(host);
        }
        out
    }
}

/// A chat line received from a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: Sender,
    /// Channel name, or the bot's own nick for private messages.
    pub target: String,
    pub text: String,
    /// True when the line was addressed to the bot rather than a channel.
    pub private: bool,
}

impl InboundMessage {
    /// Where a reply to this message should go.
    pub fn reply_target(&self) -> &str {
        if self.private {
            &self.sender.nick
        } else {
            &self.target
        }
    }
}

/// A chat line to deliver through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub target: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            text: text.into(),
        }
    }
}

/// Events a channel adapter surfaces to the bot loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Registration with the server completed.
    Connected,
    /// The bot itself joined a channel.
    Joined { channel: String },
    /// A chat line arrived.
    Message(InboundMessage),
    /// Keep-alive from the server; a good moment to flush.
    Heartbeat,
    /// The connection ended.
    Disconnected { reason: String },
}
