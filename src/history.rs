//! Extraction history log.
//!
//! A small JSON file in the data directory recording which documents
//! were processed, with what method, and how it went. Used by the
//! `history` subcommand to list recently processed files. A missing or
//! corrupt log reinitializes as empty rather than failing the run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ExtractionMethod;

/// One processed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub method: ExtractionMethod,
    pub units: usize,
    pub succeeded: usize,
}

/// JSON-backed history of extraction runs.
pub struct HistoryLog {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Load the log at `path`, starting empty if it is missing or
    /// unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Record a processed document and persist the log.
    pub fn add(
        &mut self,
        file_name: impl Into<String>,
        method: ExtractionMethod,
        units: usize,
        succeeded: usize,
    ) -> std::io::Result<()> {
        self.entries.push(HistoryEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            file_name: file_name.into(),
            method,
            units,
            succeeded,
        });
        self.save()
    }

    /// Most recently processed distinct file names, newest first.
    pub fn recent_files(&self, limit: usize) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for entry in self.entries.iter().rev() {
            if files.len() >= limit {
                break;
            }
            if seen.insert(entry.file_name.as_str()) {
                files.push(entry.file_name.as_str());
            }
        }
        files
    }

    /// Drop all entries and persist the empty log.
    pub fn clear(&mut self) -> std::io::Result<()> {
        self.entries.clear();
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, contents)
    }
}
