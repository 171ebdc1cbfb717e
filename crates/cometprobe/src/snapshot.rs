//! Visual snapshot store.
//!
//! Checkpoint screenshots are written as `<dir>/<NNN>-<slug>.png` in capture
//! order, and a `manifest.json` next to them lists label, file, size and
//! sha256 digest for whatever uploads them to a visual-diff service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::driver::Screenshot;
use crate::result::{ProbeError, ProbeResult};

/// Manifest file name inside the snapshot directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// One stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Capture order, starting at 1
    pub index: usize,
    /// Checkpoint label as given by the scenario
    pub label: String,
    /// File name relative to the snapshot directory
    pub file: String,
    /// PNG size in bytes
    pub bytes: usize,
    /// Hex sha256 of the PNG
    pub sha256: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

/// Directory of checkpoint screenshots plus their manifest
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    entries: Vec<SnapshotEntry>,
}

impl SnapshotStore {
    /// Create the directory if needed and start an empty manifest
    ///
    /// # Errors
    ///
    /// I/O errors creating the directory.
    pub fn create(dir: impl Into<PathBuf>) -> ProbeResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            entries: Vec::new(),
        })
    }

    /// Snapshot directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored entries in capture order
    #[must_use]
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Path of the manifest file
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Write a screenshot and update the manifest on disk
    ///
    /// # Errors
    ///
    /// [`ProbeError::Screenshot`] for empty captures, I/O or JSON errors.
    pub fn save(&mut self, screenshot: &Screenshot) -> ProbeResult<SnapshotEntry> {
        if screenshot.data.is_empty() {
            return Err(ProbeError::Screenshot {
                message: format!("empty capture for '{}'", screenshot.label),
            });
        }

        let index = self.entries.len() + 1;
        let file = format!("{index:03}-{}.png", slugify(&screenshot.label));
        std::fs::write(self.dir.join(&file), &screenshot.data)?;

        let entry = SnapshotEntry {
            index,
            label: screenshot.label.clone(),
            file,
            bytes: screenshot.size_bytes(),
            sha256: hex_digest(&screenshot.data),
            captured_at: DateTime::<Utc>::from(screenshot.timestamp),
        };
        info!(label = %entry.label, file = %entry.file, bytes = entry.bytes, "snapshot stored");
        self.entries.push(entry.clone());
        self.write_manifest()?;
        Ok(entry)
    }

    /// Persist the manifest
    ///
    /// # Errors
    ///
    /// I/O or JSON errors.
    pub fn write_manifest(&self) -> ProbeResult<PathBuf> {
        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Read a manifest previously written to `dir`
    ///
    /// # Errors
    ///
    /// I/O or JSON errors.
    pub fn load_manifest(dir: impl AsRef<Path>) -> ProbeResult<Vec<SnapshotEntry>> {
        let json = std::fs::read_to_string(dir.as_ref().join(MANIFEST_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// File-name slug: lowercase ASCII alphanumerics separated by single dashes
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "snapshot".to_string()
    } else {
        trimmed.to_string()
    }
}

fn hex_digest(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
