//! Size-based log rotation with gzip-compressed backups
//!
//! [`RotatingFileSink`] appends records to an active log file. Once the file
//! grows past `max_bytes`, the active file is rolled into a fixed-depth chain
//! of compressed backups:
//!
//! ```text
//! message.log          <- active file, always plain text
//! message.log.1.gz     <- newest backup
//! message.log.2.gz
//! ...
//! message.log.N.gz     <- oldest backup, evicted on the next rollover
//! ```
//!
//! All work (write, size check, rollover) happens under a single mutex, so
//! records are never interleaved and the active file is never appended to
//! while it is being copied into a backup.
//!
//! # Example
//!
//! ```no_run
//! use libris_common::rotation::{RotatingFileSink, RotationConfig};
//!
//! let config = RotationConfig::new("logs/message.log")
//!     .max_bytes(1_000_000)
//!     .backup_count(5);
//! let sink = RotatingFileSink::open(config)?;
//! sink.append("service started")?;
//! # Ok::<(), libris_common::rotation::RotationError>(())
//! ```

use flate2::{write::GzEncoder, Compression};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Default rotation threshold in bytes.
pub const DEFAULT_MAX_BYTES: u64 = 1_000_000;

/// Default number of compressed backups to keep.
pub const DEFAULT_BACKUP_COUNT: usize = 5;

/// Configuration for a [`RotatingFileSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Path of the file currently being written to
    pub active_path: PathBuf,

    /// Rotate once the active file grows past this many bytes (0 disables)
    pub max_bytes: u64,

    /// Number of `.N.gz` backups to retain (0 keeps none)
    pub backup_count: usize,

    /// Defer opening the active file until the first write
    pub delay_open: bool,
}

impl RotationConfig {
    pub fn new(active_path: impl Into<PathBuf>) -> Self {
        Self {
            active_path: active_path.into(),
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            delay_open: false,
        }
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    pub fn delay_open(mut self, delay_open: bool) -> Self {
        self.delay_open = delay_open;
        self
    }
}

/// Errors raised while writing or rotating the log file
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Failed to open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to write log file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to move backup {} to {}: {source}", from.display(), to.display())]
    Shift {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to compress {} into {}: {source}", path.display(), target.display())]
    Compress {
        path: PathBuf,
        target: PathBuf,
        source: io::Error,
    },

    #[error("Log sink is disabled after an earlier open failure")]
    Disabled,
}

#[derive(Debug, Default)]
struct SinkState {
    file: Option<File>,
    size: u64,
    disabled: bool,
}

/// Log sink that rotates its file into gzip-compressed backups by size
///
/// Cloning is cheap; clones share the same file handle and lock.
#[derive(Debug, Clone)]
pub struct RotatingFileSink {
    config: Arc<RotationConfig>,
    state: Arc<Mutex<SinkState>>,
}

impl RotatingFileSink {
    /// Create the sink, opening the active file unless `delay_open` is set
    ///
    /// An existing active file is appended to. Failing to open it here is
    /// returned as [`RotationError::Open`] so callers can refuse to start.
    pub fn open(config: RotationConfig) -> Result<Self, RotationError> {
        let mut state = SinkState::default();

        if config.delay_open {
            state.size = fs::metadata(&config.active_path)
                .map(|m| m.len())
                .unwrap_or(0);
        } else {
            let (file, size) = open_active(&config.active_path)?;
            state.file = Some(file);
            state.size = size;
        }

        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        })
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn active_path(&self) -> &Path {
        &self.config.active_path
    }

    /// Path of backup slot `n` (1 = newest)
    pub fn backup_path(&self, n: usize) -> PathBuf {
        with_suffix(&self.config.active_path, &format!(".{n}.gz"))
    }

    /// Uncompressed intermediate file used while building backup slot 1
    fn staging_path(&self) -> PathBuf {
        with_suffix(&self.config.active_path, ".1")
    }

    /// Existing backups, newest first
    pub fn backups(&self) -> Vec<PathBuf> {
        (1..=self.config.backup_count)
            .map(|n| self.backup_path(n))
            .filter(|p| p.exists())
            .collect()
    }

    /// Append `line` followed by a newline
    pub fn append(&self, line: &str) -> Result<(), RotationError> {
        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line.as_bytes());
        record.push(b'\n');
        self.write_record(&record)
    }

    /// Append an already formatted record as-is
    ///
    /// The record is always written in full before the size threshold is
    /// checked, so the active file may exceed `max_bytes` by one record.
    pub fn write_record(&self, record: &[u8]) -> Result<(), RotationError> {
        let mut state = self.lock();

        if state.disabled {
            return Err(RotationError::Disabled);
        }

        self.ensure_open(&mut state)?;

        if let Some(file) = state.file.as_mut() {
            file.write_all(record).map_err(|source| RotationError::Write {
                path: self.config.active_path.clone(),
                source,
            })?;
        }
        state.size += record.len() as u64;

        if self.config.max_bytes > 0 && state.size > self.config.max_bytes {
            self.rollover_locked(&mut state)?;
        }

        Ok(())
    }

    /// Force a rollover regardless of the current file size
    pub fn rollover(&self) -> Result<(), RotationError> {
        let mut state = self.lock();
        self.rollover_locked(&mut state)
    }

    pub fn flush(&self) -> Result<(), RotationError> {
        let mut state = self.lock();
        if let Some(file) = state.file.as_mut() {
            file.flush().map_err(|source| RotationError::Write {
                path: self.config.active_path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self, state: &mut SinkState) -> Result<(), RotationError> {
        if state.file.is_some() {
            return Ok(());
        }

        match open_active(&self.config.active_path) {
            Ok((file, size)) => {
                state.file = Some(file);
                state.size = size;
                Ok(())
            },
            Err(e) => {
                // Not retried: every later write fails fast with `Disabled`.
                state.disabled = true;
                Err(e)
            },
        }
    }

    fn rollover_locked(&self, state: &mut SinkState) -> Result<(), RotationError> {
        // Dropping the handle closes the file.
        state.file = None;

        let result = if self.config.backup_count == 0 {
            truncate(&self.config.active_path)
        } else {
            self.shift_backups().and_then(|()| self.compress_active())
        };

        // Reopen whatever happened above so logging can continue.
        if self.config.delay_open {
            state.size = fs::metadata(&self.config.active_path)
                .map(|m| m.len())
                .unwrap_or(0);
        } else if let Err(e) = self.ensure_open(state) {
            return result.and(Err(e));
        }

        result
    }

    /// Move every backup one slot older, evicting the oldest
    fn shift_backups(&self) -> Result<(), RotationError> {
        for i in (1..self.config.backup_count).rev() {
            let from = self.backup_path(i);
            if !from.exists() {
                continue;
            }
            let to = self.backup_path(i + 1);

            let shifted = remove_if_exists(&to).and_then(|()| fs::rename(&from, &to));
            shifted.map_err(|source| RotationError::Shift { from, to, source })?;
        }
        Ok(())
    }

    /// Copy the active file to staging, gzip it into slot 1, then truncate
    ///
    /// The active file is only truncated after slot 1 has been written, so a
    /// compression failure leaves its contents untouched.
    fn compress_active(&self) -> Result<(), RotationError> {
        let active = &self.config.active_path;
        let staging = self.staging_path();
        let target = self.backup_path(1);

        let compress_err = |source: io::Error| RotationError::Compress {
            path: active.clone(),
            target: target.clone(),
            source,
        };

        remove_if_exists(&staging).map_err(compress_err)?;

        if !active.exists() {
            truncate(active)?;
        }

        fs::copy(active, &staging).map_err(compress_err)?;

        if let Err(e) = gzip_file(&staging, &target) {
            let _ = fs::remove_file(&target);
            let _ = fs::remove_file(&staging);
            return Err(compress_err(e));
        }

        truncate(active)?;
        fs::remove_file(&staging).map_err(compress_err)?;

        Ok(())
    }
}

impl Write for RotatingFileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.write_record(buf) {
            Ok(()) => Ok(buf.len()),
            // The open failure was already reported; drop the record quietly.
            Err(RotationError::Disabled) => Ok(buf.len()),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingFileSink::flush(self).map_err(io::Error::other)
    }
}

fn open_active(path: &Path) -> Result<(File, u64), RotationError> {
    let open_err = |source| RotationError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)?;
    let size = file.metadata().map_err(open_err)?.len();

    Ok((file, size))
}

fn truncate(path: &Path) -> Result<(), RotationError> {
    File::create(path)
        .map(drop)
        .map_err(|source| RotationError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn gzip_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(File::create(dst)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_gz(path: &Path) -> String {
        let mut decoder = GzDecoder::new(File::open(path).unwrap());
        let mut out = String::new();
        decoder.read_to_string(&mut out).unwrap();
        out
    }

    fn sink_in(dir: &TempDir, config: impl FnOnce(RotationConfig) -> RotationConfig) -> RotatingFileSink {
        let base = RotationConfig::new(dir.path().join("test.log")).max_bytes(0);
        RotatingFileSink::open(config(base)).unwrap()
    }

    #[test]
    fn test_append_adds_newline() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c);

        sink.append("first").unwrap();
        sink.append("second").unwrap();

        let content = fs::read_to_string(sink.active_path()).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_open_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.log");
        fs::write(&path, "old\n").unwrap();

        let sink = RotatingFileSink::open(RotationConfig::new(&path)).unwrap();
        sink.append("new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn test_rollover_compresses_active_file() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.backup_count(2));

        sink.append("Test log message").unwrap();
        sink.rollover().unwrap();

        let backup = sink.backup_path(1);
        assert!(backup.exists());
        assert_eq!(read_gz(&backup), "Test log message\n");
        assert_eq!(fs::read_to_string(sink.active_path()).unwrap(), "");
        assert!(!dir.path().join("test.log.1").exists());
    }

    #[test]
    fn test_size_threshold_triggers_rollover_after_write() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.max_bytes(10).backup_count(2));

        sink.append("short").unwrap();
        assert!(!sink.backup_path(1).exists());

        sink.append("this record crosses the threshold").unwrap();

        assert_eq!(
            read_gz(&sink.backup_path(1)),
            "short\nthis record crosses the threshold\n"
        );
        assert_eq!(fs::metadata(sink.active_path()).unwrap().len(), 0);
    }

    #[test]
    fn test_exactly_max_bytes_does_not_rotate() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.max_bytes(6).backup_count(1));

        sink.append("12345").unwrap();

        assert!(!sink.backup_path(1).exists());
        assert_eq!(fs::metadata(sink.active_path()).unwrap().len(), 6);
    }

    #[test]
    fn test_backup_count_zero_truncates_without_backups() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.max_bytes(4).backup_count(0));

        sink.append("overflowing").unwrap();

        assert_eq!(fs::metadata(sink.active_path()).unwrap().len(), 0);
        assert!(sink.backups().is_empty());
        assert!(!sink.backup_path(1).exists());

        sink.append("ok").unwrap();
        assert_eq!(fs::read_to_string(sink.active_path()).unwrap(), "ok\n");
    }

    #[test]
    fn test_rollover_removes_stale_staging_file() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.backup_count(1));
        let staging = dir.path().join("test.log.1");
        fs::write(&staging, "stale").unwrap();

        sink.append("fresh").unwrap();
        sink.rollover().unwrap();

        assert!(!staging.exists());
        assert_eq!(read_gz(&sink.backup_path(1)), "fresh\n");
    }

    #[test]
    fn test_delay_open_defers_file_creation() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.delay_open(true).backup_count(1));

        assert!(!sink.active_path().exists());

        sink.append("hello").unwrap();
        assert!(sink.active_path().exists());

        sink.rollover().unwrap();
        assert_eq!(read_gz(&sink.backup_path(1)), "hello\n");

        sink.append("again").unwrap();
        assert_eq!(fs::read_to_string(sink.active_path()).unwrap(), "again\n");
    }

    #[test]
    fn test_open_failure_is_reported_at_construction() {
        let dir = TempDir::new().unwrap();
        let config = RotationConfig::new(dir.path().join("missing").join("test.log"));

        let err = RotatingFileSink::open(config).unwrap_err();
        assert!(matches!(err, RotationError::Open { .. }));
    }

    #[test]
    fn test_delayed_open_failure_disables_sink() {
        let dir = TempDir::new().unwrap();
        let config = RotationConfig::new(dir.path().join("missing").join("test.log"))
            .delay_open(true);
        let sink = RotatingFileSink::open(config).unwrap();

        assert!(matches!(sink.append("a"), Err(RotationError::Open { .. })));
        assert!(matches!(sink.append("b"), Err(RotationError::Disabled)));

        // Creating the directory afterwards does not revive the sink.
        fs::create_dir(dir.path().join("missing")).unwrap();
        assert!(matches!(sink.append("c"), Err(RotationError::Disabled)));
    }

    #[test]
    fn test_compression_failure_keeps_active_contents() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir, |c| c.backup_count(1));
        // A directory in slot 1 makes the gzip target uncreatable.
        fs::create_dir(sink.backup_path(1)).unwrap();

        sink.append("precious").unwrap();
        let err = sink.rollover().unwrap_err();

        assert!(matches!(err, RotationError::Compress { .. }));
        assert_eq!(fs::read_to_string(sink.active_path()).unwrap(), "precious\n");
        assert!(!dir.path().join("test.log.1").exists());

        // The sink was reopened and keeps accepting records.
        sink.append("still logging").unwrap();
        assert_eq!(
            fs::read_to_string(sink.active_path()).unwrap(),
            "precious\nstill logging\n"
        );
    }

    #[test]
    fn test_io_write_passes_records_through() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir, |c| c);

        sink.write_all(b"formatted record\n").unwrap();
        Write::flush(&mut sink).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("test.log")).unwrap(),
            "formatted record\n"
        );
    }

    #[test]
    fn test_backup_naming() {
        let sink = RotatingFileSink::open(
            RotationConfig::new("/var/log/libris/message.log").delay_open(true),
        )
        .unwrap();

        assert_eq!(
            sink.backup_path(3),
            PathBuf::from("/var/log/libris/message.log.3.gz")
        );
    }
}
