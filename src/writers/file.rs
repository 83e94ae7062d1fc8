//! Append-only JSON-lines file writer with size-based rotation
//!
//! Every entry is buffered as one JSON line and written through immediately.
//! When the active file has reached `max_size`, it is renamed to
//! `<stem>.<YYYY-MM-DDTHH-MM-SS>.<ext>` and a fresh file is started; only the
//! newest `keep_rotated` rotated files are kept.

use crate::core::timestamp::{rotation_stamp, starts_with_rotation_stamp, ROTATION_STAMP_LEN};
use crate::core::{LogEntry, LoggerError, Result, Writer};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Default size at which the active file is rotated (10 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of rotated files kept
pub const DEFAULT_KEEP_ROTATED: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub file_path: PathBuf,
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    #[serde(default = "default_keep_rotated")]
    pub keep_rotated: usize,
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

fn default_keep_rotated() -> usize {
    DEFAULT_KEEP_ROTATED
}

impl FileConfig {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            max_size: DEFAULT_MAX_SIZE,
            keep_rotated: DEFAULT_KEEP_ROTATED,
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_keep_rotated(mut self, keep_rotated: usize) -> Self {
        self.keep_rotated = keep_rotated;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(LoggerError::config("FileWriter", "file_path must not be empty"));
        }
        if self.file_path.file_name().is_none() {
            return Err(LoggerError::config(
                "FileWriter",
                format!("'{}' does not name a file", self.file_path.display()),
            ));
        }
        if self.max_size == 0 {
            return Err(LoggerError::config("FileWriter", "max_size must be greater than 0"));
        }
        Ok(())
    }
}

/// A file found next to the active log file
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Filesystem capability used by [`FileWriter`].
///
/// Injected at construction so hosts without file I/O (or tests) can swap
/// the implementation.
pub trait FileSystem: Send + Sync {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn file_size(&self, path: &Path) -> io::Result<u64>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    /// Regular files directly inside `dir`
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>>;
    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                files.push(DirEntryInfo {
                    path: entry.path(),
                    modified: metadata.modified()?,
                });
            }
        }
        Ok(files)
    }

    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data)?;
        file.flush()
    }
}

/// Rotating JSON-lines file writer
pub struct FileWriter {
    config: FileConfig,
    fs: Option<Arc<dyn FileSystem>>,
    pending: Mutex<Vec<String>>,
    stem: String,
    extension: Option<String>,
}

impl FileWriter {
    /// Create a writer on the local filesystem
    pub fn new(config: FileConfig) -> Result<Self> {
        Self::with_filesystem(config, Arc::new(StdFileSystem))
    }

    pub fn with_filesystem(config: FileConfig, fs: Arc<dyn FileSystem>) -> Result<Self> {
        Self::build(config, Some(fs))
    }

    /// Writer for hosts without file I/O: every call succeeds and nothing is
    /// kept.
    pub fn without_filesystem(config: FileConfig) -> Result<Self> {
        Self::build(config, None)
    }

    fn build(config: FileConfig, fs: Option<Arc<dyn FileSystem>>) -> Result<Self> {
        config.validate()?;

        let stem = config
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = config
            .file_path
            .extension()
            .map(|s| s.to_string_lossy().into_owned());

        Ok(Self {
            config,
            fs,
            pending: Mutex::new(Vec::new()),
            stem,
            extension,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.file_path
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    pub fn has_filesystem(&self) -> bool {
        self.fs.is_some()
    }

    /// Lines buffered but not yet on disk
    pub fn pending_lines(&self) -> usize {
        self.pending.lock().len()
    }

    fn directory(&self) -> PathBuf {
        match self.config.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Name of the rotated file for `stamp`, with an optional collision counter
    fn rotated_name(&self, stamp: &str, counter: u32) -> String {
        let stamp = if counter == 0 {
            stamp.to_string()
        } else {
            format!("{}-{}", stamp, counter)
        };
        match self.extension {
            Some(ref ext) => format!("{}.{}.{}", self.stem, stamp, ext),
            None => format!("{}.{}", self.stem, stamp),
        }
    }

    /// Sort key of a rotated file name, or `None` for unrelated files
    fn rotation_key<'a>(&self, file_name: &'a str) -> Option<(&'a str, u32)> {
        let rest = file_name.strip_prefix(self.stem.as_str())?.strip_prefix('.')?;
        let rest = match self.extension {
            Some(ref ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
            None => rest,
        };
        if !starts_with_rotation_stamp(rest) {
            return None;
        }

        let (stamp, tail) = rest.split_at(ROTATION_STAMP_LEN);
        if tail.is_empty() {
            return Some((stamp, 0));
        }
        let counter = tail.strip_prefix('-')?;
        if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some((stamp, counter.parse().ok()?))
    }

    fn rotate(&self, fs: &dyn FileSystem) -> Result<PathBuf> {
        let dir = self.directory();
        let stamp = rotation_stamp(&Utc::now());

        // Counters only grow within one stamp, even after pruning freed a name
        let mut counter = fs
            .list_dir(&dir)
            .unwrap_or_default()
            .iter()
            .filter_map(|info| {
                let name = info.path.file_name()?.to_str()?;
                let (existing, counter) = self.rotation_key(name)?;
                (existing == stamp).then_some(counter + 1)
            })
            .max()
            .unwrap_or(0);
        let mut target = dir.join(self.rotated_name(&stamp, counter));
        while fs.exists(&target) {
            counter += 1;
            target = dir.join(self.rotated_name(&stamp, counter));
        }

        fs.rename(&self.config.file_path, &target).map_err(|e| {
            LoggerError::file_rotation(
                self.config.file_path.display().to_string(),
                format!("Failed to rename to '{}': {}", target.display(), e),
            )
        })?;
        Ok(target)
    }

    /// Delete rotated files beyond `keep_rotated`, newest first by mtime
    fn prune(&self, fs: &dyn FileSystem) -> Result<()> {
        let dir = self.directory();
        let listing = fs.list_dir(&dir).map_err(|e| {
            LoggerError::io_operation(
                "listing rotated files",
                format!("cannot read '{}'", dir.display()),
                e,
            )
        })?;

        let mut rotated: Vec<(SystemTime, (String, u32), PathBuf)> = listing
            .into_iter()
            .filter_map(|info| {
                let name = info.path.file_name()?.to_str()?.to_string();
                let (stamp, counter) = self.rotation_key(&name)?;
                Some((info.modified, (stamp.to_string(), counter), info.path))
            })
            .collect();

        rotated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        for (_, _, path) in rotated.into_iter().skip(self.config.keep_rotated) {
            if let Err(e) = fs.remove_file(&path) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove rotated log file {}: {}",
                    path.display(),
                    e
                );
            }
        }
        Ok(())
    }

    /// Write buffered lines to disk, rotating and pruning first.
    ///
    /// On failure the buffer is kept for the next attempt.
    fn flush_pending(&self) -> Result<()> {
        let Some(fs) = self.fs.as_deref() else {
            return Ok(());
        };

        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        let dir = self.directory();
        fs.create_dir_all(&dir).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                format!("cannot create '{}'", dir.display()),
                e,
            )
        })?;

        let path = &self.config.file_path;
        if fs.exists(path) {
            let size = fs.file_size(path)?;
            if size >= self.config.max_size {
                self.rotate(fs)?;
            }
        }

        if let Err(e) = self.prune(fs) {
            eprintln!("[LOGGER WARNING] Rotated file cleanup failed: {}", e);
        }

        let mut data = pending.join("\n");
        data.push('\n');
        fs.append(path, data.as_bytes()).map_err(|e| {
            LoggerError::file_append(path.display().to_string(), format!("Failed to append: {}", e))
        })?;

        pending.clear();
        Ok(())
    }
}

#[async_trait]
impl Writer for FileWriter {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        if self.fs.is_none() {
            return Ok(());
        }

        let line = entry.to_json_line()?;
        self.pending.lock().push(line);

        if let Err(e) = self.flush_pending() {
            eprintln!(
                "[LOGGER WARNING] {} ({} line(s) kept for retry)",
                e,
                self.pending_lines()
            );
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flush_pending()
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush_pending() {
            eprintln!(
                "[LOGGER ERROR] Final flush of {} failed: {}",
                self.config.file_path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, LogSource, Metadata};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, LogSource::Server, message, Metadata::new())
    }

    fn rotated_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "app.log")
            .collect();
        names.sort();
        names
    }

    /// Std filesystem whose appends can be made to fail
    struct FlakyFileSystem {
        fail_appends: AtomicBool,
    }

    impl FileSystem for FlakyFileSystem {
        fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
            StdFileSystem.create_dir_all(dir)
        }
        fn exists(&self, path: &Path) -> bool {
            StdFileSystem.exists(path)
        }
        fn file_size(&self, path: &Path) -> io::Result<u64> {
            StdFileSystem.file_size(path)
        }
        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            StdFileSystem.rename(from, to)
        }
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            StdFileSystem.remove_file(path)
        }
        fn list_dir(&self, dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
            StdFileSystem.list_dir(dir)
        }
        fn append(&self, path: &Path, data: &[u8]) -> io::Result<()> {
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            StdFileSystem.append(path, data)
        }
    }

    #[test]
    fn test_writes_json_lines_and_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");
        let writer = FileWriter::new(FileConfig::new(&path)).unwrap();

        writer.write(&entry("first")).unwrap();
        writer.write(&entry("second")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["message"], "second");
        assert_eq!(parsed["level"], "info");
        assert_eq!(writer.pending_lines(), 0);
    }

    #[test]
    fn test_rotation_happens_once_size_reached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = FileWriter::new(FileConfig::new(&path).with_max_size(400)).unwrap();

        while fs::metadata(&path).map(|m| m.len()).unwrap_or(0) < 400 {
            writer.write(&entry("filling the active file")).unwrap();
        }
        assert!(rotated_files(dir.path()).is_empty());

        writer.write(&entry("after rotation")).unwrap();

        let rotated = rotated_files(dir.path());
        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].starts_with("app."));
        assert!(rotated[0].ends_with(".log"));

        let active = fs::read_to_string(&path).unwrap();
        assert_eq!(active.lines().count(), 1);
        assert!(active.contains("after rotation"));
    }

    #[test]
    fn test_retention_keeps_newest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = FileWriter::new(
            FileConfig::new(&path)
                .with_max_size(1)
                .with_keep_rotated(2),
        )
        .unwrap();

        for i in 0..6 {
            writer.write(&entry(&format!("entry {}", i))).unwrap();
        }

        let rotated = rotated_files(dir.path());
        assert_eq!(rotated.len(), 2, "rotated files: {:?}", rotated);

        // Every line but the last was rotated away; the newest rotated file
        // holds the second to last entry.
        let newest = rotated
            .iter()
            .filter_map(|name| {
                let key = writer.rotation_key(name)?;
                Some((key.0.to_string(), key.1, name.clone()))
            })
            .max()
            .map(|(_, _, name)| name)
            .unwrap();
        let content = fs::read_to_string(dir.path().join(newest)).unwrap();
        assert!(content.contains("entry 4"));
    }

    #[test]
    fn test_unrelated_files_survive_pruning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(dir.path().join("app.backup.log"), "keep").unwrap();
        fs::write(dir.path().join("other.2020-01-01T00-00-00.log"), "keep").unwrap();

        let writer = FileWriter::new(
            FileConfig::new(&path)
                .with_max_size(1)
                .with_keep_rotated(0),
        )
        .unwrap();
        for i in 0..3 {
            writer.write(&entry(&format!("entry {}", i))).unwrap();
        }

        let remaining = rotated_files(dir.path());
        assert_eq!(
            remaining,
            vec!["app.backup.log".to_string(), "other.2020-01-01T00-00-00.log".to_string()]
        );
    }

    #[test]
    fn test_rotation_key_recognises_counter_suffix() {
        let writer = FileWriter::without_filesystem(FileConfig::new("logs/app.log")).unwrap();

        assert_eq!(
            writer.rotation_key("app.2025-01-08T10-30-45.log"),
            Some(("2025-01-08T10-30-45", 0))
        );
        assert_eq!(
            writer.rotation_key("app.2025-01-08T10-30-45-3.log"),
            Some(("2025-01-08T10-30-45", 3))
        );
        assert_eq!(writer.rotation_key("app.log"), None);
        assert_eq!(writer.rotation_key("app.2025-01-08T10-30-45-.log"), None);
        assert_eq!(writer.rotation_key("app.2025-01-08T10-30-45.txt"), None);
    }

    #[tokio::test]
    async fn test_failed_append_keeps_lines_for_retry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let flaky = Arc::new(FlakyFileSystem {
            fail_appends: AtomicBool::new(true),
        });
        let writer = FileWriter::with_filesystem(FileConfig::new(&path), flaky.clone()).unwrap();

        writer.write(&entry("one")).unwrap();
        writer.write(&entry("two")).unwrap();
        assert_eq!(writer.pending_lines(), 2);
        assert!(writer.flush().await.is_err());

        flaky.fail_appends.store(false, Ordering::SeqCst);
        writer.flush().await.unwrap();

        assert_eq!(writer.pending_lines(), 0);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"one\""));
    }

    #[tokio::test]
    async fn test_without_filesystem_is_silent() {
        let writer = FileWriter::without_filesystem(FileConfig::new("/nonexistent/app.log")).unwrap();
        assert!(!writer.has_filesystem());

        writer.write(&entry("dropped")).unwrap();
        writer.flush().await.unwrap();
        assert_eq!(writer.pending_lines(), 0);
    }

    #[test]
    fn test_drop_flushes_pending_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let flaky = Arc::new(FlakyFileSystem {
            fail_appends: AtomicBool::new(true),
        });
        let writer = FileWriter::with_filesystem(FileConfig::new(&path), flaky.clone()).unwrap();
        writer.write(&entry("late")).unwrap();

        flaky.fail_appends.store(false, Ordering::SeqCst);
        drop(writer);

        assert!(fs::read_to_string(&path).unwrap().contains("late"));
    }

    #[test]
    fn test_config_validation() {
        assert!(FileConfig::new("").validate().is_err());
        assert!(FileConfig::new("app.log").with_max_size(0).validate().is_err());
        assert!(FileConfig::new("app.log").validate().is_ok());

        let config: FileConfig = serde_json::from_str(r#"{"file_path": "logs/app.log"}"#).unwrap();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.keep_rotated, DEFAULT_KEEP_ROTATED);
    }
}
