use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::io::lock::{self, LockError, SaveLock};
use crate::model::data::TodoData;
use crate::parse::{self, CodecError, DecodeReport};

/// Primary data file name
pub const DATA_FILE: &str = "data.json";

/// Error type for store persistence and import
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not encode data: {0}")]
    Codec(#[from] CodecError),
    #[error("import rejected: {0}")]
    MalformedImport(CodecError),
    #[error("{0}")]
    Lock(#[from] LockError),
}

/// Why a single data file could not be read
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Malformed(#[from] CodecError),
}

/// The file set of one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    /// `data.json`
    pub primary: PathBuf,
    /// `data.json.backup`, the previous generation
    pub backup: PathBuf,
    /// `data.json.tmp`, staging file during a save
    pub temp: PathBuf,
    /// `data.json.corrupt`, an unreadable primary set aside during recovery
    pub quarantine: PathBuf,
}

impl DataPaths {
    pub fn new(dir: &Path) -> Self {
        DataPaths {
            dir: dir.to_path_buf(),
            primary: dir.join(DATA_FILE),
            backup: dir.join(format!("{}.backup", DATA_FILE)),
            temp: dir.join(format!("{}.tmp", DATA_FILE)),
            quarantine: dir.join(format!("{}.corrupt", DATA_FILE)),
        }
    }
}

/// Where `load_with_fallback` found its data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Primary,
    Backup,
    Empty,
}

/// Result of the load chain
#[derive(Debug)]
pub struct Loaded {
    pub data: TodoData,
    pub source: LoadSource,
    pub report: DecodeReport,
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Persist `data` with the tmp → backup → primary rotation.
///
/// 1. write the encoded container to `data.json.tmp` and fsync it
/// 2. if `data.json` exists, drop the old backup and rename `data.json` to `data.json.backup`
/// 3. rename `data.json.tmp` to `data.json`
///
/// A crash at any point leaves either the old primary + old backup or the new
/// primary + old primary as backup. The primary is never half-written.
pub fn write_container(paths: &DataPaths, data: &TodoData) -> Result<(), StoreError> {
    let bytes = parse::encode(data)?;
    let _lock = SaveLock::acquire(&paths.dir, lock::DEFAULT_TIMEOUT)?;

    write_synced(&paths.temp, &bytes).map_err(|source| StoreError::Io {
        path: paths.temp.clone(),
        source,
    })?;

    if paths.primary.exists() {
        if let Err(e) = fs::remove_file(&paths.backup)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            return Err(StoreError::Io {
                path: paths.backup.clone(),
                source: e,
            });
        }
        fs::rename(&paths.primary, &paths.backup).map_err(|source| StoreError::Io {
            path: paths.backup.clone(),
            source,
        })?;
    }

    fs::rename(&paths.temp, &paths.primary).map_err(|source| StoreError::Io {
        path: paths.primary.clone(),
        source,
    })?;
    debug!(path = %paths.primary.display(), bytes = bytes.len(), "saved");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// Read and decode one data file
pub fn read_container(path: &Path) -> Result<(TodoData, DecodeReport), ReadError> {
    let bytes = fs::read(path)?;
    Ok(parse::decode_with_report(&bytes)?)
}

/// Load the best available data: primary, then backup, then empty.
///
/// Never fails. When the backup is used, an unreadable primary is moved to
/// `data.json.corrupt` and the backup contents are written back as the new
/// primary straight away.
pub fn load_with_fallback(paths: &DataPaths) -> Loaded {
    let primary_err = match read_container(&paths.primary) {
        Ok((data, report)) => {
            return Loaded {
                data,
                source: LoadSource::Primary,
                report,
            };
        }
        Err(e) => e,
    };
    log_read_failure(&paths.primary, &primary_err);

    match read_container(&paths.backup) {
        Ok((data, report)) => {
            warn!(path = %paths.backup.display(), "recovered from backup");
            if paths.primary.exists()
                && let Err(e) = fs::rename(&paths.primary, &paths.quarantine)
            {
                warn!(path = %paths.primary.display(), error = %e, "could not set aside unreadable primary");
            }
            if let Err(e) = write_container(paths, &data) {
                error!(error = %e, "could not restore primary from backup");
            }
            Loaded {
                data,
                source: LoadSource::Backup,
                report,
            }
        }
        Err(backup_err) => {
            log_read_failure(&paths.backup, &backup_err);
            Loaded {
                data: TodoData::empty(),
                source: LoadSource::Empty,
                report: DecodeReport::default(),
            }
        }
    }
}

fn log_read_failure(path: &Path, err: &ReadError) {
    match err {
        ReadError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no data file");
        }
        _ => warn!(path = %path.display(), error = %err, "unreadable data file"),
    }
}

/// The primary file's bytes, exactly as persisted
pub fn read_primary_bytes(paths: &DataPaths) -> Result<Vec<u8>, StoreError> {
    fs::read(&paths.primary).map_err(|source| StoreError::Io {
        path: paths.primary.clone(),
        source,
    })
}
