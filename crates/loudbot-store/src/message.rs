// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A stored loud message.

use std::cmp::Ordering;
use std::fmt;

use loudbot_core::MessageRecord;
use loudbot_core::types::INITIAL_SCORE;

/// One remembered message.
///
/// Ordering compares text, then score, then views, then author. It exists
/// for deterministic exports and tests, not storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: Option<i64>,
    text: String,
    author: String,
    score: i64,
    views: u64,
}

impl Message {
    /// A fresh message: score 1, no views, no backend id.
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            author: author.into(),
            score: INITIAL_SCORE,
            views: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn views(&self) -> u64 {
        self.views
    }

    /// Backend row id; only set once the SQLite backend stored the message.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn record_view(&mut self) {
        self.views = self.views.saturating_add(1);
    }

    pub fn upvote(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    pub fn downvote(&mut self) {
        self.score = self.score.saturating_sub(1);
    }

    /// Plain attribute bundle for a backend.
    pub fn to_snapshot(&self) -> MessageRecord {
        MessageRecord {
            id: self.id,
            text: self.text.clone(),
            author: self.author.clone(),
            score: self.score,
            views: self.views,
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            author: record.author,
            score: record.score,
            views: record.views,
        }
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.text
            .cmp(&other.text)
            .then_with(|| self.score.cmp(&other.score))
            .then_with(|| self.views.cmp(&other.views))
            .then_with(|| self.author.cmp(&other.author))
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
