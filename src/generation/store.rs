//! Persistence of generation records and error logs.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Identifier of a persisted generation.
pub type GenerationId = u64;

/// Boxed future returned by [`GenerationStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Input for a new generation record.
#[derive(Clone, Debug)]
pub struct NewGeneration {
    /// Owner of the generation.
    pub user_id: String,
    /// Model that produced the proposals.
    pub model: String,
    /// Text the cards were generated from.
    pub source_text: String,
    /// Number of proposals returned.
    pub generated_count: u32,
    /// Wall-clock time of the provider call.
    pub generation_duration_ms: u64,
}

/// A persisted generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Record id.
    pub id: GenerationId,
    /// Owner of the generation.
    pub user_id: String,
    /// Model that produced the proposals.
    pub model: String,
    /// Text the cards were generated from.
    pub source_text: String,
    /// Length of `source_text` in characters.
    pub source_text_length: u32,
    /// Number of proposals returned.
    pub generated_count: u32,
    /// Proposals accepted after editing; starts at zero.
    pub accepted_edited_count: u32,
    /// Proposals accepted as-is; starts at zero.
    pub accepted_unedited_count: u32,
    /// Wall-clock time of the provider call.
    pub generation_duration_ms: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl GenerationRecord {
    fn from_new(id: GenerationId, new: NewGeneration) -> Self {
        let now = Utc::now();
        Self {
            id,
            source_text_length: char_len(&new.source_text),
            user_id: new.user_id,
            model: new.model,
            source_text: new.source_text,
            generated_count: new.generated_count,
            accepted_edited_count: 0,
            accepted_unedited_count: 0,
            generation_duration_ms: new.generation_duration_ms,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for a new error log row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGenerationErrorLog {
    /// User whose generation failed.
    pub user_id: String,
    /// Stable error code.
    pub error_code: String,
    /// Message, at most 500 characters.
    pub error_message: String,
    /// Model that was requested.
    pub model: String,
    /// SHA-256 of the source text.
    pub source_text_hash: String,
    /// Length of the source text in characters.
    pub source_text_length: u32,
}

/// A persisted error log row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationErrorLog {
    /// Row id.
    pub id: u64,
    /// User whose generation failed.
    pub user_id: String,
    /// Stable error code.
    pub error_code: String,
    /// Message, at most 500 characters.
    pub error_message: String,
    /// Model that was requested.
    pub model: String,
    /// SHA-256 of the source text.
    pub source_text_hash: String,
    /// Length of the source text in characters.
    pub source_text_length: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl GenerationErrorLog {
    fn from_new(id: u64, new: NewGenerationErrorLog) -> Self {
        Self {
            id,
            user_id: new.user_id,
            error_code: new.error_code,
            error_message: new.error_message,
            model: new.model,
            source_text_hash: new.source_text_hash,
            source_text_length: new.source_text_length,
            created_at: Utc::now(),
        }
    }
}

/// Storage for generation outcomes.
pub trait GenerationStore: Send + Sync {
    /// Inserts a generation record and returns its id.
    fn insert_generation(&self, generation: NewGeneration) -> StoreFuture<'_, GenerationId>;

    /// Inserts an error log row.
    fn insert_error_log(&self, log: NewGenerationErrorLog) -> StoreFuture<'_, ()>;
}

/// Length of `text` in characters, saturating at `u32::MAX`.
pub(crate) fn char_len(text: &str) -> u32 {
    u32::try_from(text.chars().count()).unwrap_or(u32::MAX)
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    generations: Mutex<Vec<GenerationRecord>>,
    error_logs: Mutex<Vec<GenerationErrorLog>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of stored generations.
    pub fn generations(&self) -> Vec<GenerationRecord> {
        self.generations
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Returns a snapshot of stored error logs.
    pub fn error_logs(&self) -> Vec<GenerationErrorLog> {
        self.error_logs
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl GenerationStore for MemoryStore {
    fn insert_generation(&self, generation: NewGeneration) -> StoreFuture<'_, GenerationId> {
        Box::pin(async move {
            let mut rows = self
                .generations
                .lock()
                .map_err(|_| anyhow::anyhow!("generation table lock poisoned"))?;
            let id = rows.len() as GenerationId + 1;
            rows.push(GenerationRecord::from_new(id, generation));
            Ok(id)
        })
    }

    fn insert_error_log(&self, log: NewGenerationErrorLog) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut rows = self
                .error_logs
                .lock()
                .map_err(|_| anyhow::anyhow!("error log table lock poisoned"))?;
            let id = rows.len() as u64 + 1;
            rows.push(GenerationErrorLog::from_new(id, log));
            Ok(())
        })
    }
}

const GENERATIONS_FILE: &str = "generations.jsonl";
const ERROR_LOGS_FILE: &str = "generation_error_logs.jsonl";

/// Store that appends rows as JSON lines under a data directory.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates if needed) a store in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Opens the store in `$HOME/.flashgen/data`.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::utils::settings::flashgen_home()?.join("data"))
    }

    /// Data directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads all stored generations.
    pub async fn generations(&self) -> Result<Vec<GenerationRecord>> {
        read_rows(&self.dir.join(GENERATIONS_FILE)).await
    }

    /// Reads all stored error logs.
    pub async fn error_logs(&self) -> Result<Vec<GenerationErrorLog>> {
        read_rows(&self.dir.join(ERROR_LOGS_FILE)).await
    }
}

impl GenerationStore for JsonFileStore {
    fn insert_generation(&self, generation: NewGeneration) -> StoreFuture<'_, GenerationId> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let path = self.dir.join(GENERATIONS_FILE);
            let tail = scan_tail(&path).await?;
            let id = tail.next_id;
            append_row(&path, &tail, &GenerationRecord::from_new(id, generation)).await?;
            Ok(id)
        })
    }

    fn insert_error_log(&self, log: NewGenerationErrorLog) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let path = self.dir.join(ERROR_LOGS_FILE);
            let tail = scan_tail(&path).await?;
            let id = tail.next_id;
            append_row(&path, &tail, &GenerationErrorLog::from_new(id, log)).await
        })
    }
}

#[derive(Deserialize)]
struct RowId {
    id: u64,
}

/// State of a rows file before an append.
struct FileTail {
    next_id: u64,
    // Set when a previous write was cut off before its newline.
    unterminated: bool,
}

async fn scan_tail(path: &Path) -> Result<FileTail> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileTail {
                next_id: 1,
                unterminated: false,
            })
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let last_id = content
        .lines()
        .filter_map(|line| serde_json::from_str::<RowId>(line).ok())
        .map(|row| row.id)
        .max()
        .unwrap_or(0);
    Ok(FileTail {
        next_id: last_id + 1,
        unterminated: !content.is_empty() && !content.ends_with('\n'),
    })
}

async fn append_row<T: Serialize>(path: &Path, tail: &FileTail, row: &T) -> Result<()> {
    let mut line = String::new();
    if tail.unterminated {
        line.push('\n');
    }
    line.push_str(&serde_json::to_string(row).context("Failed to serialize row")?);
    line.push('\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.flush().await?;
    Ok(())
}

async fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    let rows = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(i, line)| match serde_json::from_str(line) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Skipping malformed row at line {} in {}: {e}", i + 1, path.display());
                None
            }
        })
        .collect();
    Ok(rows)
}
