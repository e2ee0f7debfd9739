// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backend trait for durable message persistence.

use async_trait::async_trait;
use rand::RngCore;

use crate::error::LoudbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AssignedId, MessageRecord, WriteBatch};

/// Durable storage for the message set.
///
/// A backend only reads and writes records. Working-set management,
/// dirty tracking and vote policy live in the message store.
#[async_trait]
pub trait MessageBackend: PluginAdapter {
    /// Prepares the backend (opens files or connections, runs migrations).
    async fn initialize(&self) -> Result<(), LoudbotError>;

    /// Loads the records the store should start with.
    ///
    /// Whole-file backends return everything; row backends may return a
    /// bounded, weighted subset. `rng` drives any random selection.
    async fn retrieve_messages(
        &self,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<MessageRecord>, LoudbotError>;

    /// Returns true if `text` is present in durable storage.
    ///
    /// Backends whose retrieval always loads the complete set may answer
    /// `false`; the store checks its in-memory set first.
    async fn exists(&self, text: &str) -> Result<bool, LoudbotError>;

    /// Persists a flush batch, returning identities assigned to inserted records.
    ///
    /// Writing the same batch twice must leave the same durable state: a
    /// flush that timed out may still have committed before it is retried.
    async fn write_data(&self, batch: &WriteBatch) -> Result<Vec<AssignedId>, LoudbotError>;

    /// Releases the backend after a final flush.
    async fn close(&self) -> Result<(), LoudbotError>;
}
