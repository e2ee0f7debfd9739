// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for loudbot.

use thiserror::Error;

/// The primary error type used across the message store, storage backends
/// and channel adapters.
#[derive(Debug, Error)]
pub enum LoudbotError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// `add` was called with text that is already stored.
    #[error("message already stored: {text:?}")]
    DuplicateKey { text: String },

    /// `random` was called while no messages are loaded.
    #[error("no messages available")]
    EmptyStore,

    /// A vote or lookup named text that is not in the in-memory set.
    #[error("unknown message: {text:?}")]
    UnknownMessage { text: String },

    /// Durable storage could not be read or written (I/O, decode, database).
    #[error("storage backend unavailable: {source}")]
    BackendUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored record is missing required fields or holds impossible values.
    #[error("corrupt record: {reason}")]
    CorruptRecord { reason: String },

    /// Channel adapter errors (connection failure, protocol violation).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LoudbotError {
    /// Wraps any error as [`LoudbotError::BackendUnavailable`].
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BackendUnavailable {
            source: Box::new(err),
        }
    }

    /// Returns true for failures that a later flush may succeed at.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::Timeout { .. } | Self::Channel { .. }
        )
    }
}
