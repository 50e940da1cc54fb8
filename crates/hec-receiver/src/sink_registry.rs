// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::SinkError;
use crate::event::LogEntry;

const LOG_FILE_EXTENSION: &str = "log";

/// Append-only file backing a single index.
#[derive(Debug)]
pub struct Sink {
    index: String,
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Sink {
    fn open(index: &str, path: PathBuf) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;
        debug!("Opened sink for index {index} at {}", path.display());
        Ok(Self {
            index: index.to_string(),
            path,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the entry as one newline terminated JSON document and flushes it
    /// before returning. Concurrent writers to the same sink never interleave
    /// within a line.
    pub fn write_entry(&self, entry: &LogEntry) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(entry).map_err(|source| SinkError::Serialize {
            index: self.index.clone(),
            source,
        })?;
        line.push(b'\n');

        let mut guard = lock(&self.file);
        let file = guard
            .as_mut()
            .ok_or_else(|| SinkError::Closed(self.index.clone()))?;
        file.write_all(&line)
            .and_then(|()| file.flush())
            .map_err(|source| SinkError::Write {
                index: self.index.clone(),
                source,
            })
    }

    /// Flushes and releases the file handle. Closing twice is a no-op.
    pub fn close(&self) {
        if let Some(mut file) = lock(&self.file).take() {
            let _ = file.flush();
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.file).is_none()
    }
}

/// Owns one open [`Sink`] per index seen since startup.
#[derive(Debug)]
pub struct SinkRegistry {
    log_dir: PathBuf,
    sinks: Mutex<HashMap<String, Arc<Sink>>>,
}

impl SinkRegistry {
    /// Creates the log directory (and its parents) if needed.
    pub fn new(log_dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let log_dir = log_dir.into();
        fs::create_dir_all(&log_dir).map_err(|source| SinkError::CreateDir {
            path: log_dir.clone(),
            source,
        })?;
        Ok(Self {
            log_dir,
            sinks: Mutex::new(HashMap::new()),
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the file backing `index`, whether or not it exists yet.
    pub fn log_path(&self, index: &str) -> Result<PathBuf, SinkError> {
        validate_index_name(index)?;
        Ok(self
            .log_dir
            .join(format!("{index}.{LOG_FILE_EXTENSION}")))
    }

    /// Returns the sink for `index`, opening its file on first use.
    pub fn get_or_create(&self, index: &str) -> Result<Arc<Sink>, SinkError> {
        let path = self.log_path(index)?;
        let mut sinks = lock(&self.sinks);
        if let Some(sink) = sinks.get(index) {
            return Ok(Arc::clone(sink));
        }
        let sink = Arc::new(Sink::open(index, path)?);
        sinks.insert(index.to_string(), Arc::clone(&sink));
        Ok(sink)
    }

    pub fn append(&self, entry: &LogEntry) -> Result<(), SinkError> {
        self.get_or_create(&entry.index)?.write_entry(entry)
    }

    /// Names of the indexes with an open sink, sorted.
    pub fn open_indexes(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.sinks).keys().cloned().collect();
        names.sort();
        names
    }

    /// Closes every open sink. Safe to call more than once.
    pub fn close_all(&self) {
        let sinks = lock(&self.sinks);
        for sink in sinks.values() {
            sink.close();
        }
        debug!("Closed {} sinks", sinks.len());
    }
}

/// Index names map straight to file names, so anything that could escape the
/// log directory is refused.
pub fn validate_index_name(index: &str) -> Result<(), SinkError> {
    let invalid = index.is_empty()
        || index == "."
        || index == ".."
        || index.contains(['/', '\\', '\0']);
    if invalid {
        return Err(SinkError::InvalidIndexName(index.to_string()));
    }
    Ok(())
}

// A panic while holding a sink lock can't leave a partial line behind, so a
// poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
