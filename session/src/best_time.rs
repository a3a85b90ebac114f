//! Persistence of the single best-survived-time record.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

/// Storage for the best survived time.
pub trait BestTimeStore {
    /// Reads the stored record, or `None` when nothing has been recorded.
    fn load(&mut self) -> Result<Option<Duration>, StoreError>;

    /// Overwrites the stored record.
    fn save(&mut self, best: Duration) -> Result<(), StoreError>;
}

/// Failures raised while reading or writing the record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("failed to access best time record at {path}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file does not hold a non-negative number of seconds.
    #[error("best time record at {path} is malformed: {value:?}")]
    Malformed {
        /// File that was read.
        path: PathBuf,
        /// Contents that failed to parse.
        value: String,
    },
}

/// In-memory record, used by tests and headless runs without persistence.
#[derive(Clone, Debug, Default)]
pub struct MemoryBestTimeStore {
    best: Option<Duration>,
    saves: u32,
}

impl MemoryBestTimeStore {
    /// Creates a store that already holds `best`.
    #[must_use]
    pub fn with_best(best: Duration) -> Self {
        Self {
            best: Some(best),
            saves: 0,
        }
    }

    /// Currently stored record.
    #[must_use]
    pub fn best(&self) -> Option<Duration> {
        self.best
    }

    /// Number of successful writes.
    #[must_use]
    pub fn saves(&self) -> u32 {
        self.saves
    }
}

impl BestTimeStore for MemoryBestTimeStore {
    fn load(&mut self) -> Result<Option<Duration>, StoreError> {
        Ok(self.best)
    }

    fn save(&mut self, best: Duration) -> Result<(), StoreError> {
        self.best = Some(best);
        self.saves += 1;
        Ok(())
    }
}

/// Record kept as decimal seconds in a single text file.
#[derive(Clone, Debug)]
pub struct FileBestTimeStore {
    path: PathBuf,
}

impl FileBestTimeStore {
    /// Creates a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl BestTimeStore for FileBestTimeStore {
    fn load(&mut self) -> Result<Option<Duration>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(self.io_error(error)),
        };

        let trimmed = contents.trim();
        parse_seconds(trimmed)
            .map(Some)
            .ok_or_else(|| StoreError::Malformed {
                path: self.path.clone(),
                value: trimmed.to_owned(),
            })
    }

    fn save(&mut self, best: Duration) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| self.io_error(error))?;
            }
        }
        fs::write(
            &self.path,
            format!("{}.{:09}\n", best.as_secs(), best.subsec_nanos()),
        )
            .map_err(|error| self.io_error(error))
    }
}

/// Parses a non-negative decimal number of seconds with nanosecond precision.
fn parse_seconds(value: &str) -> Option<Duration> {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 9 {
        return None;
    }

    let secs = if whole.is_empty() { 0 } else { whole.parse::<u64>().ok()? };
    let nanos = if fraction.is_empty() {
        0
    } else {
        fraction.parse::<u32>().ok()? * 10u32.pow(9 - fraction.len() as u32)
    };
    Some(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("overheat-best-time-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_reads_as_no_record() {
        let mut store = FileBestTimeStore::new(scratch_path("missing.txt"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn saved_record_is_read_back() {
        let path = scratch_path("round.txt");
        let mut store = FileBestTimeStore::new(&path);
        store.save(Duration::from_millis(83_250)).unwrap();

        let mut reopened = FileBestTimeStore::new(&path);
        assert_eq!(reopened.load().unwrap(), Some(Duration::from_millis(83_250)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn record_keeps_sub_millisecond_precision() {
        let path = scratch_path("precise.txt");
        let mut store = FileBestTimeStore::new(&path);
        let best = Duration::new(83, 250_400_017);
        store.save(best).unwrap();

        let mut reopened = FileBestTimeStore::new(&path);
        let loaded = reopened.load().unwrap().unwrap();
        assert_eq!(loaded, best);
        assert!(Duration::new(83, 250_400_018) > loaded);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn hand_written_records_parse() {
        assert_eq!(parse_seconds("83.25"), Some(Duration::from_millis(83_250)));
        assert_eq!(parse_seconds("12"), Some(Duration::from_secs(12)));
        assert_eq!(parse_seconds(".5"), Some(Duration::from_millis(500)));
        assert_eq!(parse_seconds("."), None);
        assert_eq!(parse_seconds("1.0000000001"), None);
        assert_eq!(parse_seconds("1e3"), None);
    }

    #[test]
    fn garbage_is_reported_as_malformed() {
        let path = scratch_path("garbage.txt");
        let mut store = FileBestTimeStore::new(&path);
        store.save(Duration::ZERO).unwrap();
        fs::write(&path, "not a time").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
        fs::write(&path, "-4.0").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Malformed { .. })));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn memory_store_counts_writes() {
        let mut store = MemoryBestTimeStore::default();
        assert_eq!(store.load().unwrap(), None);
        store.save(Duration::from_secs(3)).unwrap();
        assert_eq!(store.best(), Some(Duration::from_secs(3)));
        assert_eq!(store.saves(), 1);
    }
}
