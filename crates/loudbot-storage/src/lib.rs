// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence backends for the loudbot message set.
//!
//! Two implementations of [`MessageBackend`] live here: a whole-file JSON
//! backend and a WAL-mode SQLite backend with embedded migrations and
//! weighted retrieval. [`open_backend`] picks one from configuration.

pub mod database;
pub mod flatfile;
pub mod migrations;
pub mod queries;
pub mod sqlite;
pub mod weighting;

use loudbot_config::model::StorageConfig;
use loudbot_core::{BackendKind, MessageBackend};

pub use database::Database;
pub use flatfile::FlatFileBackend;
pub use sqlite::SqliteBackend;

/// Builds the backend selected by `config.backend`.
///
/// The backend is not initialized; call [`MessageBackend::initialize`] first.
pub fn open_backend(config: &StorageConfig) -> Box<dyn MessageBackend> {
    match config.backend {
        BackendKind::FlatFile => Box::new(FlatFileBackend::new(&config.flat_file_path)),
        BackendKind::Sqlite => Box::new(SqliteBackend::new(config.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_backend_follows_config() {
        let mut config = StorageConfig::default();
        config.backend = BackendKind::FlatFile;
        assert_eq!(open_backend(&config).name(), "flat_file");

        config.backend = BackendKind::Sqlite;
        assert_eq!(open_backend(&config).name(), "sqlite");
    }
}
