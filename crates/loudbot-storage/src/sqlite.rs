// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`MessageBackend`].

use async_trait::async_trait;
use rand::RngCore;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use loudbot_config::model::StorageConfig;
use loudbot_core::{
    AdapterType, AssignedId, HealthStatus, LoudbotError, MessageBackend, MessageRecord,
    PluginAdapter, WriteBatch,
};

use crate::database::Database;
use crate::queries;
use crate::weighting;

/// SQLite-backed message storage.
///
/// Retrieval loads a weighted subset of rows rather than the whole table.
/// Writes insert new rows and update changed ones; rows are never deleted,
/// a deleted message simply keeps its floor-or-lower score. The database is
/// opened on [`MessageBackend::initialize`].
pub struct SqliteBackend {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteBackend {
    /// The connection is not opened until [`MessageBackend::initialize`].
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, LoudbotError> {
        self.db.get().ok_or_else(|| LoudbotError::BackendUnavailable {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Number of rows in the table, deleted messages included.
    pub async fn row_count(&self) -> Result<u64, LoudbotError> {
        queries::messages::count_messages(self.db()?).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LoudbotError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("database not opened".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LoudbotError> {
        match self.db.get() {
            Some(db) => db.close().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MessageBackend for SqliteBackend {
    async fn initialize(&self) -> Result<(), LoudbotError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LoudbotError::BackendUnavailable {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn retrieve_messages(
        &self,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<MessageRecord>, LoudbotError> {
        let candidates = queries::messages::fetch_candidates(
            self.db()?,
            self.config.deletion_floor,
            self.config.max_retrieval_size(),
        )
        .await?;
        let scanned = candidates.len();

        let selected =
            weighting::weighted_selection(candidates, self.config.min_retrieval_size, rng);
        info!(scanned, selected = selected.len(), "weighted retrieval complete");
        Ok(selected)
    }

    async fn exists(&self, text: &str) -> Result<bool, LoudbotError> {
        queries::messages::text_exists(self.db()?, text).await
    }

    async fn write_data(&self, batch: &WriteBatch) -> Result<Vec<AssignedId>, LoudbotError> {
        if batch.inserted.is_empty() && batch.updated.is_empty() {
            return Ok(Vec::new());
        }
        let ids = queries::messages::write_batch(
            self.db()?,
            batch.inserted.clone(),
            batch.updated.clone(),
        )
        .await?;
        debug!(
            inserted = batch.inserted.len(),
            updated = batch.updated.len(),
            "wrote message batch"
        );
        Ok(ids)
    }

    async fn close(&self) -> Result<(), LoudbotError> {
        self.db()?.close().await
    }
}
