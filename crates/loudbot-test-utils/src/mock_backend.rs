// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock storage backend for deterministic testing.
//!
//! `MockBackend` keeps its "durable" records in memory. Clones share state,
//! so a test can hand one clone to the store and inspect the other.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngCore;
use tokio::sync::Mutex;

use loudbot_core::{
    AdapterType, AssignedId, HealthStatus, LoudbotError, MessageBackend, MessageRecord,
    PluginAdapter, WriteBatch,
};

#[derive(Default)]
struct State {
    records: Vec<MessageRecord>,
    writes: Vec<WriteBatch>,
    failures_remaining: usize,
    write_delay: Option<Duration>,
    next_id: i64,
    closed: bool,
}

/// How the mock treats writes and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Like the flat-file backend: `all` replaces everything, `exists` is always false.
    WholeSet,
    /// Like the SQLite backend: inserts get ids, updates apply by id, `exists` looks up rows.
    Rows,
}

#[derive(Clone)]
pub struct MockBackend {
    mode: MockMode,
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn whole_set() -> Self {
        Self::with_mode(MockMode::WholeSet)
    }

    pub fn rows() -> Self {
        Self::with_mode(MockMode::Rows)
    }

    fn with_mode(mode: MockMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(State {
                next_id: 1,
                ..State::default()
            })),
        }
    }

    /// Seeds the durable records returned by the next retrieval.
    ///
    /// In [`MockMode::Rows`] records without an id are given one.
    pub async fn seed(&self, records: Vec<MessageRecord>) {
        let mut state = self.state.lock().await;
        for mut record in records {
            if self.mode == MockMode::Rows && record.id.is_none() {
                record.id = Some(state.next_id);
                state.next_id += 1;
            }
            state.records.push(record);
        }
    }

    /// Makes the next `count` writes fail with `BackendUnavailable`.
    pub async fn fail_next_writes(&self, count: usize) {
        self.state.lock().await.failures_remaining = count;
    }

    /// Delays every write, for timeout tests.
    pub async fn set_write_delay(&self, delay: Duration) {
        self.state.lock().await.write_delay = Some(delay);
    }

    /// Every batch that was written successfully, oldest first.
    pub async fn writes(&self) -> Vec<WriteBatch> {
        self.state.lock().await.writes.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes.len()
    }

    /// Current durable records.
    pub async fn records(&self) -> Vec<MessageRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LoudbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LoudbotError> {
        Ok(())
    }
}

#[async_trait]
impl MessageBackend for MockBackend {
    async fn initialize(&self) -> Result<(), LoudbotError> {
        Ok(())
    }

    async fn retrieve_messages(
        &self,
        _rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<MessageRecord>, LoudbotError> {
        let state = self.state.lock().await;
        Ok(state.records.clone())
    }

    async fn exists(&self, text: &str) -> Result<bool, LoudbotError> {
        match self.mode {
            MockMode::WholeSet => Ok(false),
            MockMode::Rows => Ok(self.state.lock().await.records.iter().any(|r| r.text == text)),
        }
    }

    async fn write_data(&self, batch: &WriteBatch) -> Result<Vec<AssignedId>, LoudbotError> {
        let delay = self.state.lock().await.write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(LoudbotError::backend(std::io::Error::other(
                "mock backend write failure",
            )));
        }

        let mut assigned = Vec::new();
        match self.mode {
            MockMode::WholeSet => state.records = batch.all.clone(),
            MockMode::Rows => {
                for record in &batch.inserted {
                    let existing = state.records.iter().position(|r| r.text == record.text);
                    let id = match existing {
                        Some(index) => {
                            let row = &mut state.records[index];
                            row.score = record.score;
                            row.views = record.views;
                            row.id.unwrap_or_default()
                        }
                        None => {
                            let id = state.next_id;
                            state.next_id += 1;
                            state.records.push(MessageRecord {
                                id: Some(id),
                                ..record.clone()
                            });
                            id
                        }
                    };
                    assigned.push(AssignedId {
                        text: record.text.clone(),
                        id,
                    });
                }
                for record in &batch.updated {
                    if let Some(row) = state
                        .records
                        .iter_mut()
                        .find(|r| r.id.is_some() && r.id == record.id)
                    {
                        row.score = record.score;
                        row.views = record.views;
                    }
                }
            }
        }
        state.writes.push(batch.clone());
        Ok(assigned)
    }

    async fn close(&self) -> Result<(), LoudbotError> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[tokio::test]
    async fn rows_mode_assigns_ids_and_applies_updates() {
        let backend = MockBackend::rows();
        let ids = backend
            .write_data(&WriteBatch {
                inserted: vec![MessageRecord::new("A LOUD", "x")],
                ..WriteBatch::default()
            })
            .await
            .unwrap();
        assert_eq!(ids[0].id, 1);
        assert!(backend.exists("A LOUD").await.unwrap());

        let mut changed = MessageRecord::new("A LOUD", "x");
        changed.id = Some(1);
        changed.score = 7;
        backend
            .write_data(&WriteBatch {
                updated: vec![changed],
                ..WriteBatch::default()
            })
            .await
            .unwrap();
        assert_eq!(backend.records().await[0].score, 7);
    }

    #[tokio::test]
    async fn rows_mode_reinsert_reuses_the_row() {
        let backend = MockBackend::rows();
        let batch = WriteBatch {
            inserted: vec![MessageRecord::new("TWICE LOUD", "x")],
            ..WriteBatch::default()
        };
        let first = backend.write_data(&batch).await.unwrap();
        let second = backend.write_data(&batch).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(backend.records().await.len(), 1);
    }

    #[tokio::test]
    async fn whole_set_mode_replaces_records() {
        let backend = MockBackend::whole_set();
        backend.seed(vec![MessageRecord::new("OLD", "x")]).await;
        backend
            .write_data(&WriteBatch {
                all: vec![MessageRecord::new("NEW", "y")],
                ..WriteBatch::default()
            })
            .await
            .unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let records = backend.retrieve_messages(&mut rng).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "NEW");
        assert!(!backend.exists("NEW").await.unwrap());
    }

    #[tokio::test]
    async fn scripted_failures_run_out() {
        let backend = MockBackend::whole_set();
        backend.fail_next_writes(1).await;
        assert!(backend.write_data(&WriteBatch::default()).await.is_err());
        assert!(backend.write_data(&WriteBatch::default()).await.is_ok());
        assert_eq!(backend.write_count().await, 1);
    }
}
