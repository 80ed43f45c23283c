//! Cross-run memory of surfaced links.
//!
//! The store is a newline-delimited file of link hashes. It only ever grows:
//! hashes are appended after a digest has been delivered and are never removed.
//! One run at a time is assumed; concurrent runs would race on read-then-append.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stable identifier of a link: SHA-256, lowercase hex.
pub fn link_hash(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hashes considered already surfaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRecord {
    hashes: HashSet<String>,
}

impl HistoryRecord {
    pub fn from_hashes<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hashes: hashes.into_iter().map(Into::into).collect(),
        }
    }

    fn parse(data: &str) -> Self {
        Self::from_hashes(data.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// File-backed history.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every persisted hash. A missing or unreadable file is an empty
    /// history, never an error.
    pub async fn load(&self) -> HistoryRecord {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => {
                let record = HistoryRecord::parse(&data);
                info!(path = %self.path.display(), "Loaded {} history entries", record.len());
                record
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No history file yet, starting empty");
                HistoryRecord::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read history, treating as empty: {}", e);
                HistoryRecord::default()
            }
        }
    }

    /// Appends `hashes` to the file. The new content is written to a sibling
    /// temporary file and renamed into place, so a crash leaves either the old
    /// or the new file.
    pub async fn commit(&self, hashes: &[String]) -> Result<()> {
        if hashes.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create history directory: {}", parent.display()))?;
        }

        let mut content = match tokio::fs::read_to_string(&self.path).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read history file: {}", self.path.display()))
            }
        };
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        for hash in hashes {
            content.push_str(hash);
            content.push('\n');
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, content.as_bytes())
            .await
            .with_context(|| format!("Failed to write history file: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace history file: {}", self.path.display()))?;

        info!(path = %self.path.display(), "Committed {} new history entries", hashes.len());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "history".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
