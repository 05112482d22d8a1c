// src/query_log.rs
// Append-only record of every resolution: query -> source -> link.
// The resolver writes here and never reads back.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LogError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub source: String,
    pub link: String,
}

/// What a sink actually stores: the entry plus an id and a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedQuery {
    pub id: String,
    pub logged_at: DateTime<Utc>,
    pub query: String,
    pub source: String,
    pub link: String,
}

impl LoggedQuery {
    fn stamp(entry: QueryLogEntry) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            logged_at: Utc::now(),
            query: entry.query,
            source: entry.source,
            link: entry.link,
        }
    }
}

#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn append(&self, entry: QueryLogEntry) -> Result<(), LogError>;
}

/// Default sink when no log file is configured: one structured `info!` event per query.
/// Keeps nothing in memory.
#[derive(Debug, Default)]
pub struct TracingQueryLog;

#[async_trait]
impl QueryLog for TracingQueryLog {
    async fn append(&self, entry: QueryLogEntry) -> Result<(), LogError> {
        tracing::info!(
            target: "govlink_core::query_log",
            query = %entry.query,
            source = %entry.source,
            link = %entry.link,
            "Query resolved"
        );
        Ok(())
    }
}

/// In-process sink for tests and tooling. Unbounded; not wired into the server.
/// Concurrent appends land in independent shards, no global order.
#[derive(Debug, Default)]
pub struct MemoryQueryLog {
    records: DashMap<String, LoggedQuery>,
}

impl MemoryQueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot ordered by timestamp, then id.
    pub fn snapshot(&self) -> Vec<LoggedQuery> {
        let mut records: Vec<LoggedQuery> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.logged_at.cmp(&b.logged_at).then_with(|| a.id.cmp(&b.id)));
        records
    }
}

#[async_trait]
impl QueryLog for MemoryQueryLog {
    async fn append(&self, entry: QueryLogEntry) -> Result<(), LogError> {
        let record = LoggedQuery::stamp(entry);
        self.records.insert(record.id.clone(), record);
        Ok(())
    }
}

/// CSV file sink. The header row is written only when the file starts empty.
/// Writes run on the blocking pool so the HTTP workers never wait on disk.
pub struct CsvQueryLog {
    path: PathBuf,
    writer: Arc<Mutex<csv::Writer<std::fs::File>>>,
}

impl CsvQueryLog {
    pub fn open(path: &Path) -> Result<Self, LogError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        Ok(Self {
            path: path.to_path_buf(),
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QueryLog for CsvQueryLog {
    async fn append(&self, entry: QueryLogEntry) -> Result<(), LogError> {
        let record = LoggedQuery::stamp(entry);
        let writer = Arc::clone(&self.writer);
        tokio::task::spawn_blocking(move || -> Result<(), LogError> {
            let mut writer = writer.lock().map_err(|_| LogError::Poisoned)?;
            writer.serialize(&record)?;
            writer.flush()?;
            Ok(())
        })
        .await?
    }
}
