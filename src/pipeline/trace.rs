// Provenance tracing
// Append-only JSONL log of how every variation was produced

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::compose::{AppliedEffect, VariationRecord};

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Trace writer lock poisoned")]
    Poisoned,
}

/// One produced variation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub timestamp: DateTime<Utc>,

    pub category: String,

    /// Source file name inside the category folder
    pub source: String,

    /// Hex SHA-256 of the source file bytes
    pub source_sha256: String,

    /// Output file name inside the category output folder
    pub output: String,

    /// Effects in the order they were applied
    pub effects: Vec<AppliedEffect>,

    pub peak_rescaled: bool,
}

impl ProvenanceEntry {
    pub fn new(
        category: impl Into<String>,
        source: impl Into<String>,
        source_sha256: impl Into<String>,
        output: impl Into<String>,
        record: &VariationRecord,
    ) -> Self {
        ProvenanceEntry {
            timestamp: Utc::now(),
            category: category.into(),
            source: source.into(),
            source_sha256: source_sha256.into(),
            output: output.into(),
            effects: record.effects.clone(),
            peak_rescaled: record.peak_rescaled,
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Hex SHA-256 digest of a file
pub fn file_sha256(path: &Path) -> Result<String, TraceError> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Provenance writer for one category
///
/// The file is truncated on creation so a rerun replaces the previous log
/// together with the overwritten outputs.
pub struct TraceWriter {
    file_path: PathBuf,
    file: Mutex<File>,
}

impl TraceWriter {
    pub fn create(file_path: PathBuf) -> Result<Self, TraceError> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&file_path)?;

        Ok(TraceWriter {
            file_path,
            file: Mutex::new(file),
        })
    }

    /// Append an entry and flush
    pub fn write(&self, entry: &ProvenanceEntry) -> Result<(), TraceError> {
        let json_line = entry.to_json_line()?;
        let mut file = self.file.lock().map_err(|_| TraceError::Poisoned)?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Get the trace file path
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Read provenance entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<ProvenanceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: ProvenanceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
