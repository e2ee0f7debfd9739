// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store: the in-memory set, the working set and flush bookkeeping.
//!
//! The store is single-writer. Callers that share it across tasks wrap it
//! in one async mutex so every public operation runs alone.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use loudbot_core::{AssignedId, LoudbotError, MessageBackend, WriteBatch};

use crate::message::Message;

/// Tunables the store applies on top of its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// A message whose score reaches this value or lower is deleted.
    pub deletion_floor: i64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { deletion_floor: -1 }
    }
}

/// Result of a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The message is still stored with its new score.
    Updated(Message),
    /// The score fell to the deletion floor; the message is gone.
    Deleted(Message),
}

/// Point-in-time counters for logging and health output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub loaded: usize,
    pub working_set: usize,
    pub pending_new: usize,
    pub pending_changed: usize,
    pub dirty: bool,
}

/// Owns every loaded message and decides what a flush writes.
pub struct MessageStore {
    backend: Box<dyn MessageBackend>,
    options: StoreOptions,
    rng: StdRng,
    messages: HashMap<String, Message>,
    /// Keys still to be drawn this cycle; the next draw pops from the end.
    working_set: Vec<String>,
    dirty: bool,
    pending_new: HashSet<String>,
    pending_changed: HashSet<String>,
    /// Deleted since the last flush; row backends still need their final score.
    removed: HashMap<String, Message>,
}

impl MessageStore {
    /// Loads the initial message set from `backend`.
    ///
    /// The backend must already be initialized. A retrieval failure is
    /// returned as-is; the bot cannot start without its state.
    pub async fn load(
        backend: Box<dyn MessageBackend>,
        options: StoreOptions,
        mut rng: StdRng,
    ) -> Result<Self, LoudbotError> {
        let records = backend.retrieve_messages(&mut rng).await?;

        let mut messages = HashMap::with_capacity(records.len());
        for record in records {
            if messages.contains_key(&record.text) {
                warn!(text = %record.text, "duplicate text in stored records, keeping the first");
                continue;
            }
            messages.insert(record.text.clone(), Message::from(record));
        }
        info!(count = messages.len(), backend = backend.name(), "message store loaded");

        Ok(Self {
            backend,
            options,
            rng,
            messages,
            working_set: Vec::new(),
            dirty: false,
            pending_new: HashSet::new(),
            pending_changed: HashSet::new(),
            removed: HashMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, text: &str) -> Option<&Message> {
        self.messages.get(text)
    }

    /// All loaded messages in their natural order.
    pub fn sorted(&self) -> Vec<Message> {
        let mut all: Vec<_> = self.messages.values().cloned().collect();
        all.sort();
        all
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loaded: self.messages.len(),
            working_set: self.working_set.len(),
            pending_new: self.pending_new.len(),
            pending_changed: self.pending_changed.len(),
            dirty: self.dirty,
        }
    }

    /// True if `text` is loaded or, for partially loaded backends, stored.
    pub async fn exists(&self, text: &str) -> Result<bool, LoudbotError> {
        if self.messages.contains_key(text) {
            return Ok(true);
        }
        self.backend.exists(text).await
    }

    /// Stores a new message with score 1 and no views.
    ///
    /// Fails with [`LoudbotError::DuplicateKey`] if the text is already known.
    /// The new message joins the draw pool at the next reshuffle.
    pub async fn add(&mut self, text: &str, author: &str) -> Result<Message, LoudbotError> {
        if self.exists(text).await? {
            return Err(LoudbotError::DuplicateKey {
                text: text.to_string(),
            });
        }

        // Re-adding something deleted before it was ever written replaces it.
        if let Some(old) = self.removed.get(text) {
            if old.id().is_none() {
                self.removed.remove(text);
            }
        }

        let message = Message::new(text, author);
        self.messages.insert(text.to_string(), message.clone());
        self.pending_new.insert(text.to_string());
        self.dirty = true;
        debug!(text, author, "added message");
        Ok(message)
    }

    /// Draws the next message from the working set and records a view.
    ///
    /// An empty working set is refilled with a fresh shuffle of every
    /// loaded key, so each message is drawn once per cycle.
    pub fn random(&mut self) -> Result<Message, LoudbotError> {
        if self.messages.is_empty() {
            return Err(LoudbotError::EmptyStore);
        }

        if self.working_set.is_empty() {
            self.working_set = self.messages.keys().cloned().collect();
            self.working_set.shuffle(&mut self.rng);
            debug!(size = self.working_set.len(), "reshuffled working set");
        }

        let key = self.working_set.pop().ok_or(LoudbotError::EmptyStore)?;
        let message = self
            .messages
            .get_mut(&key)
            .ok_or_else(|| LoudbotError::Internal(format!("working set key {key:?} not loaded")))?;
        message.record_view();
        let drawn = message.clone();
        self.mark_changed(&key);
        Ok(drawn)
    }

    pub fn upvote(&mut self, text: &str) -> Result<VoteOutcome, LoudbotError> {
        self.vote(text, Message::upvote)
    }

    /// Lowers the score, deleting the message once it reaches the floor.
    pub fn downvote(&mut self, text: &str) -> Result<VoteOutcome, LoudbotError> {
        self.vote(text, Message::downvote)
    }

    fn vote(&mut self, text: &str, apply: fn(&mut Message)) -> Result<VoteOutcome, LoudbotError> {
        let message = self
            .messages
            .get_mut(text)
            .ok_or_else(|| LoudbotError::UnknownMessage {
                text: text.to_string(),
            })?;
        apply(message);
        let score = message.score();

        if score > self.options.deletion_floor {
            let updated = message.clone();
            self.mark_changed(text);
            return Ok(VoteOutcome::Updated(updated));
        }

        let Some(removed) = self.messages.remove(text) else {
            return Err(LoudbotError::UnknownMessage {
                text: text.to_string(),
            });
        };
        self.working_set.retain(|k| k != text);
        self.pending_new.remove(text);
        self.pending_changed.remove(text);
        self.removed.insert(text.to_string(), removed.clone());
        self.dirty = true;
        info!(text, score, "message deleted after downvote");
        Ok(VoteOutcome::Deleted(removed))
    }

    fn mark_changed(&mut self, text: &str) {
        if !self.pending_new.contains(text) {
            self.pending_changed.insert(text.to_string());
        }
        self.dirty = true;
    }

    fn build_batch(&self) -> WriteBatch {
        let all = self.sorted().iter().map(Message::to_snapshot).collect();

        let mut inserted = Vec::new();
        let mut updated = Vec::new();
        for text in &self.pending_new {
            if let Some(message) = self.messages.get(text) {
                inserted.push(message.to_snapshot());
            }
        }
        for text in &self.pending_changed {
            if let Some(message) = self.messages.get(text) {
                updated.push(message.to_snapshot());
            }
        }
        for message in self.removed.values() {
            if message.id().is_some() {
                updated.push(message.to_snapshot());
            } else {
                inserted.push(message.to_snapshot());
            }
        }
        inserted.sort_by(|a, b| a.text.cmp(&b.text));
        updated.sort_by(|a, b| a.text.cmp(&b.text));

        WriteBatch {
            all,
            inserted,
            updated,
        }
    }

    /// Writes pending changes if there are any.
    ///
    /// Returns `Ok(false)` without touching the backend when nothing is
    /// dirty. On failure every pending change is kept for the next attempt.
    pub async fn flush(&mut self) -> Result<bool, LoudbotError> {
        if !self.dirty {
            return Ok(false);
        }

        let batch = self.build_batch();
        let assigned = self.backend.write_data(&batch).await?;

        for AssignedId { text, id } in assigned {
            if let Some(message) = self.messages.get_mut(&text) {
                message.set_id(id);
            }
        }
        self.pending_new.clear();
        self.pending_changed.clear();
        self.removed.clear();
        self.dirty = false;
        debug!(
            total = batch.all.len(),
            inserted = batch.inserted.len(),
            updated = batch.updated.len(),
            "flushed message store"
        );
        Ok(true)
    }

    /// Closes the backend. Call [`MessageStore::flush`] first.
    pub async fn close(&self) -> Result<(), LoudbotError> {
        if self.dirty {
            warn!("closing message store with unflushed changes");
        }
        self.backend.close().await
    }
}
