// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-file JSON backend.
//!
//! The complete message set is rewritten on every flush through a temp file
//! and a rename, so a crash never leaves a truncated state file behind.
//! Files written before versioning (a bare JSON array) are still readable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use loudbot_core::{
    AdapterType, AssignedId, HealthStatus, LoudbotError, MessageBackend, MessageRecord,
    PluginAdapter, WriteBatch,
};

/// Newest file format this build reads and the one it writes.
pub const FORMAT_VERSION: u64 = 1;

#[derive(Serialize)]
struct Document<'a> {
    version: u64,
    messages: &'a [MessageRecord],
}

/// Message set persisted as one JSON document.
pub struct FlatFileBackend {
    path: PathBuf,
}

impl FlatFileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("louds"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Decodes a state file, skipping records that cannot be read.
///
/// Unparseable JSON, an unknown layout or a newer format version fail the
/// whole load. A file whose every record is unreadable also fails.
pub fn decode_document(bytes: &[u8]) -> Result<Vec<MessageRecord>, LoudbotError> {
    let value: Value = serde_json::from_slice(bytes).map_err(LoudbotError::backend)?;

    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let version = map.get("version").and_then(Value::as_u64).ok_or_else(|| {
                LoudbotError::CorruptRecord {
                    reason: "state file has no numeric `version`".to_string(),
                }
            })?;
            if version > FORMAT_VERSION {
                return Err(LoudbotError::BackendUnavailable {
                    source: format!(
                        "state file version {version} is newer than supported version {FORMAT_VERSION}"
                    )
                    .into(),
                });
            }
            match map.remove("messages") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(LoudbotError::CorruptRecord {
                        reason: "state file has no `messages` list".to_string(),
                    });
                }
            }
        }
        _ => {
            return Err(LoudbotError::CorruptRecord {
                reason: "state file is neither an object nor a list".to_string(),
            });
        }
    };

    let total = entries.len();
    let mut records = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<MessageRecord>(entry) {
            Ok(record) if !record.text.is_empty() => records.push(MessageRecord {
                id: None,
                ..record
            }),
            Ok(_) => warn!(index, "skipping corrupt record: empty text"),
            Err(e) => warn!(index, error = %e, "skipping corrupt record"),
        }
    }

    if total > 0 && records.is_empty() {
        return Err(LoudbotError::CorruptRecord {
            reason: format!("none of the {total} stored records could be read"),
        });
    }
    Ok(records)
}

/// Renders the versioned document written on every flush.
pub fn encode_document(messages: &[MessageRecord]) -> Result<Vec<u8>, LoudbotError> {
    serde_json::to_vec_pretty(&Document {
        version: FORMAT_VERSION,
        messages,
    })
    .map_err(LoudbotError::backend)
}

#[async_trait]
impl PluginAdapter for FlatFileBackend {
    fn name(&self) -> &str {
        "flat_file"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LoudbotError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                dir.display()
            ))),
            Err(e) => Ok(HealthStatus::Degraded(format!("{}: {e}", dir.display()))),
        }
    }

    async fn shutdown(&self) -> Result<(), LoudbotError> {
        Ok(())
    }
}

#[async_trait]
impl MessageBackend for FlatFileBackend {
    async fn initialize(&self) -> Result<(), LoudbotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(LoudbotError::backend)?;
            }
        }
        debug!(path = %self.path.display(), "flat-file storage initialized");
        Ok(())
    }

    async fn retrieve_messages(
        &self,
        _rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<MessageRecord>, LoudbotError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(LoudbotError::backend(e)),
        };

        let records = decode_document(&bytes)?;
        info!(path = %self.path.display(), count = records.len(), "loaded messages");
        Ok(records)
    }

    async fn exists(&self, _text: &str) -> Result<bool, LoudbotError> {
        // Retrieval loads everything, so the store's in-memory check is complete.
        Ok(false)
    }

    async fn write_data(&self, batch: &WriteBatch) -> Result<Vec<AssignedId>, LoudbotError> {
        let bytes = encode_document(&batch.all)?;
        let tmp = self.temp_path();

        if let Err(e) = replace_file(&tmp, &self.path, &bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "could not remove temp file");
                }
            }
            return Err(LoudbotError::backend(e));
        }
        sync_parent_dir(&self.path).await;

        debug!(path = %self.path.display(), count = batch.all.len(), "wrote state file");
        Ok(Vec::new())
    }

    async fn close(&self) -> Result<(), LoudbotError> {
        Ok(())
    }
}

/// Writes `bytes` to `tmp`, syncs it and renames it over `path`.
async fn replace_file(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp, path).await
}

/// Makes the rename itself durable. Not every platform can open a directory.
async fn sync_parent_dir(path: &Path) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let synced = match tokio::fs::File::open(dir).await {
        Ok(handle) => handle.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = synced {
        debug!(dir = %dir.display(), error = %e, "could not sync directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn batch_of(records: Vec<MessageRecord>) -> WriteBatch {
        WriteBatch {
            all: records,
            ..WriteBatch::default()
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_set() {
        let dir = tempdir().unwrap();
        let backend = FlatFileBackend::new(dir.path().join("louds.json"));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(backend.retrieve_messages(&mut rng).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("louds.json");
        let backend = FlatFileBackend::new(&path);
        backend.initialize().await.unwrap();

        let mut second = MessageRecord::new("SECOND", "Second Author");
        second.score = 4;
        second.views = 9;
        backend
            .write_data(&batch_of(vec![MessageRecord::new("FIRST", "First Author"), second]))
            .await
            .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let mut loaded = backend.retrieve_messages(&mut rng).await.unwrap();
        loaded.sort_by(|a, b| a.text.cmp(&b.text));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "FIRST");
        assert_eq!(loaded[0].author, "First Author");
        assert_eq!(loaded[1].score, 4);
        assert_eq!(loaded[1].views, 9);
        assert!(!backend.temp_path().exists(), "temp file is renamed away");
    }

    #[tokio::test]
    async fn written_file_is_versioned_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("louds.json");
        let backend = FlatFileBackend::new(&path);
        backend
            .write_data(&batch_of(vec![MessageRecord::new("LOUD", "A")]))
            .await
            .unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["version"], FORMAT_VERSION);
        assert_eq!(value["messages"][0]["text"], "LOUD");
        assert!(value["messages"][0].get("id").is_none());
    }

    #[tokio::test]
    async fn rewrite_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let backend = FlatFileBackend::new(dir.path().join("louds.json"));
        backend
            .write_data(&batch_of(vec![MessageRecord::new("OLD ONE", "A")]))
            .await
            .unwrap();
        backend
            .write_data(&batch_of(vec![MessageRecord::new("NEW ONE", "B")]))
            .await
            .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let loaded = backend.retrieve_messages(&mut rng).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "NEW ONE");
    }

    #[tokio::test]
    async fn failed_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("louds.json");
        // A non-empty directory in the way makes the final rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();
        let backend = FlatFileBackend::new(&path);

        let err = backend
            .write_data(&batch_of(vec![MessageRecord::new("NEVER LANDS", "A")]))
            .await
            .unwrap_err();
        assert!(matches!(err, LoudbotError::BackendUnavailable { .. }));
        assert!(!backend.temp_path().exists());
        assert!(path.join("keep").exists());
    }

    #[tokio::test]
    async fn relative_path_writes_into_current_dir() {
        let name = format!("loudbot-flatfile-{}.json", std::process::id());
        let backend = FlatFileBackend::new(&name);
        backend
            .write_data(&batch_of(vec![MessageRecord::new("RIGHT HERE NOW", "A")]))
            .await
            .unwrap();
        let written = std::fs::read(&name);
        std::fs::remove_file(&name).unwrap();
        assert!(written.unwrap().starts_with(b"{"));
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn legacy_bare_array_is_accepted() {
        let json = br#"[{"text":"OLD SCHOOL LOUD","author":"Ancient","score":2,"views":5}]"#;
        let records = decode_document(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 2);
    }

    #[test]
    fn newer_version_is_fatal() {
        let json = br#"{"version":99,"messages":[]}"#;
        let err = decode_document(json).unwrap_err();
        assert!(matches!(err, LoudbotError::BackendUnavailable { .. }));
    }

    #[test]
    fn unparseable_file_is_fatal() {
        let err = decode_document(b"{not json").unwrap_err();
        assert!(matches!(err, LoudbotError::BackendUnavailable { .. }));
    }

    #[test]
    #[traced_test]
    fn corrupt_records_are_skipped() {
        let json = br#"{"version":1,"messages":[
            {"text":"GOOD LOUD LINE","author":"A"},
            {"author":"no text"},
            {"text":"","author":"empty"},
            {"text":"ALSO GOOD","score":"high"}
        ]}"#;
        let records = decode_document(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "GOOD LOUD LINE");
        assert!(logs_contain("skipping corrupt record"));
    }

    #[test]
    fn all_corrupt_is_an_error() {
        let json = br#"{"version":1,"messages":[{"author":"x"},{"score":3}]}"#;
        let err = decode_document(json).unwrap_err();
        assert!(matches!(err, LoudbotError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn exists_defers_to_memory() {
        let backend = FlatFileBackend::new("unused.json");
        assert!(!backend.exists("ANYTHING").await.unwrap());
    }
}
