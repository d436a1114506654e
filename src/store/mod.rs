//! In-memory transcription record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A stored transcription result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRecord {
    /// Transcribed text
    pub text: String,

    /// When the record was stored (ISO-8601 on the wire)
    pub timestamp: DateTime<Utc>,
}

impl TranscriptionRecord {
    /// Create a record stamped with the current time.
    pub fn new(text: String) -> Self {
        Self {
            text,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record store plus the process-wide "transcription active"
/// flag the toggle endpoint flips.
///
/// Records are kept in insertion order and never deduplicated or evicted;
/// readers poll via `all()`.
pub struct TranscriptionLog {
    records: Mutex<Vec<TranscriptionRecord>>,
    active: AtomicBool,
}

impl TranscriptionLog {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            active: AtomicBool::new(false),
        }
    }

    /// Append a record.
    pub async fn append(&self, record: TranscriptionRecord) {
        let mut records = self.records.lock().await;
        records.push(record);
    }

    /// All records in insertion order.
    pub async fn all(&self) -> Vec<TranscriptionRecord> {
        let records = self.records.lock().await;
        records.clone()
    }

    /// Whether transcription is currently active.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Flip the active flag, returning the new state.
    pub fn toggle_active(&self) -> bool {
        !self.active.fetch_xor(true, Ordering::SeqCst)
    }
}

impl Default for TranscriptionLog {
    fn default() -> Self {
        Self::new()
    }
}
