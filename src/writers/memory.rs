//! In-memory writer for test inspection

use crate::core::{LogEntry, LogLevel, Result, Writer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Append-only record of every entry received.
///
/// Clones share the same storage, so a test can keep one handle and give
/// another to the logger.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in arrival order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn levels(&self) -> Vec<LogLevel> {
        self.entries.lock().iter().map(|e| e.level).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[async_trait]
impl Writer for MemoryWriter {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
