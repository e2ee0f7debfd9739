// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for loudbot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use loudbot_core::BackendKind;
use serde::{Deserialize, Serialize};

/// Top-level loudbot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoudbotConfig {
    /// IRC network connection settings.
    #[serde(default)]
    pub irc: IrcConfig,

    /// Bot behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Message storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// IRC network connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IrcConfig {
    /// Server hostname. Empty means "not configured"; `serve` requires it.
    #[serde(default)]
    pub server: String,

    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connect over TLS.
    #[serde(default)]
    pub use_tls: bool,

    /// Nickname to register with.
    #[serde(default = "default_nickname")]
    pub nickname: String,

    /// Username sent in the USER command.
    #[serde(default = "default_username")]
    pub username: String,

    /// Real name sent in the USER command.
    #[serde(default = "default_realname")]
    pub realname: String,

    /// Channels to join once the server welcomes us.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Line sent to a channel right after the bot joins it.
    #[serde(default = "default_join_greeting")]
    pub join_greeting: Option<String>,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: default_port(),
            use_tls: false,
            nickname: default_nickname(),
            username: default_username(),
            realname: default_realname(),
            channels: Vec::new(),
            join_greeting: default_join_greeting(),
        }
    }
}

fn default_port() -> u16 {
    6667
}

fn default_nickname() -> String {
    "SUPERLOUD".to_string()
}

fn default_username() -> String {
    "2LOUD4U".to_string()
}

fn default_realname() -> String {
    "John Botfrakker".to_string()
}

fn default_join_greeting() -> Option<String> {
    Some("WHATS WRONG WITH BEING SEXY".to_string())
}

/// Bot behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between timer-driven flushes of the message store.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Regexes matched against `nick!user@host`; matching senders are ignored.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Regexes matched against `nick!user@host`; when non-empty, only
    /// matching senders are heard.
    #[serde(default)]
    pub allow_patterns: Vec<String>,

    /// Handles that belong to one person, stored under a single nickname.
    #[serde(default)]
    pub aliases: Vec<AliasConfig>,

    /// Words that disqualify an otherwise loud line (case-insensitive).
    #[serde(default = "default_blocked_words")]
    pub blocked_words: Vec<String>,

    /// Prefix that marks a line as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            ignore_patterns: Vec::new(),
            allow_patterns: Vec::new(),
            aliases: Vec::new(),
            blocked_words: default_blocked_words(),
            command_prefix: default_command_prefix(),
        }
    }
}

/// Maps every sender whose `nick!user@host` matches `pattern` to `nick`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    pub pattern: String,
    pub nick: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    60
}

fn default_blocked_words() -> Vec<String> {
    vec!["retard".to_string()]
}

fn default_command_prefix() -> String {
    "!".to_string()
}

/// Message storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Which backend holds the durable message set.
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Path of the flat-file state (used by the `flat_file` backend).
    #[serde(default = "default_flat_file_path")]
    pub flat_file_path: String,

    /// Path to the SQLite database file (used by the `sqlite` backend).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Number of messages the SQLite backend aims to load per retrieval.
    #[serde(default = "default_min_retrieval_size")]
    pub min_retrieval_size: usize,

    /// Candidate scan bound, as a multiple of `min_retrieval_size`.
    #[serde(default = "default_max_retrieval_factor")]
    pub max_retrieval_factor: usize,

    /// Messages whose score drops to or below this are deleted.
    #[serde(default = "default_deletion_floor")]
    pub deletion_floor: i64,

    /// Upper bound, in seconds, on a single flush.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            flat_file_path: default_flat_file_path(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            min_retrieval_size: default_min_retrieval_size(),
            max_retrieval_factor: default_max_retrieval_factor(),
            deletion_floor: default_deletion_floor(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

impl StorageConfig {
    /// Largest number of candidate rows a weighted retrieval scans.
    pub fn max_retrieval_size(&self) -> usize {
        self.min_retrieval_size
            .saturating_mul(self.max_retrieval_factor)
    }

    /// The path the selected backend writes to.
    pub fn active_path(&self) -> &str {
        match self.backend {
            BackendKind::FlatFile => &self.flat_file_path,
            BackendKind::Sqlite => &self.database_path,
        }
    }
}

fn default_backend() -> BackendKind {
    BackendKind::FlatFile
}

fn default_flat_file_path() -> String {
    data_file("louds.json")
}

fn default_database_path() -> String {
    data_file("louds.db")
}

fn data_file(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("loudbot").join(name))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| name.to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_min_retrieval_size() -> usize {
    100
}

fn default_max_retrieval_factor() -> usize {
    100
}

fn default_deletion_floor() -> i64 {
    -1
}

fn default_io_timeout_secs() -> u64 {
    10
}
