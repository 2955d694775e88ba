//! Parser for Squirrel `RELEASES` index files.
//!
//! Each non-empty line is whitespace-delimited: `SHA1 FILENAME [SIZE]`.
//! The filename in the first line names the update package to check.

use super::{VerifyError, VerifyResult};

/// Name of the index file in a Windows release directory.
pub const RELEASES_FILE: &str = "RELEASES";

/// One package listed in a `RELEASES` index.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    pub sha1: String,
    pub filename: String,
    pub size: Option<u64>,
}

/// A parsed `RELEASES` index. Always holds at least one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasesIndex {
    entries: Vec<ReleaseEntry>,
}

impl ReleasesIndex {
    pub fn parse(body: &str) -> VerifyResult<Self> {
        let body = body.trim_start_matches('\u{feff}');
        let mut entries = Vec::new();

        for (idx, line) in body.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(sha1) = fields.next() else {
                continue;
            };
            let filename = fields.next().ok_or_else(|| VerifyError::Parse {
                line: idx + 1,
                reason: format!("expected at least 2 fields, got 1 in {:?}", line.trim()),
            })?;
            let size = fields.next().and_then(|s| s.parse::<u64>().ok());

            entries.push(ReleaseEntry {
                sha1: sha1.to_string(),
                filename: filename.to_string(),
                size,
            });
        }

        if entries.is_empty() {
            return Err(VerifyError::Parse {
                line: 0,
                reason: "index is empty".to_string(),
            });
        }

        Ok(Self { entries })
    }

    /// Filename of the package the updater fetches next.
    pub fn update_filename(&self) -> &str {
        &self.entries[0].filename
    }

    pub fn entries(&self) -> &[ReleaseEntry] {
        &self.entries
    }
}
