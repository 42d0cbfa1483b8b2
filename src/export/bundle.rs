//! The per-package JSON artifact

use crate::error::Result;
use crate::utils::escape_path_segment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Extension of every bundle file
pub const BUNDLE_EXTENSION: &str = "json";

/// File name of the bundle for `package`: `<escaped name>.json`
///
/// Escaping also covers `/`, so the bundle always lands directly in the
/// output directory.
pub fn bundle_file_name(package: &str) -> String {
    format!("{}.{BUNDLE_EXTENSION}", escape_path_segment(package))
}

/// Mapping of stage-relative file paths to their text content
///
/// Serialized as `{"files": {"<path>": "<content>", ...}}` with keys sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// File contents keyed by their path inside the stage
    pub files: BTreeMap<String, String>,
}

impl Bundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, converting its bytes to text
    ///
    /// Valid UTF-8 is stored unchanged; invalid sequences are replaced with
    /// U+FFFD since JSON strings cannot carry them.
    pub fn insert(&mut self, name: impl Into<String>, content: &[u8]) {
        self.files
            .insert(name.into(), String::from_utf8_lossy(content).into_owned());
    }

    /// Number of files in the bundle
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no file has been added
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Serialize to the on-disk representation (JSON plus trailing newline)
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write the bundle to `path`, truncating any existing file
    ///
    /// Returns only once the data has reached the disk, so a failing write-back
    /// surfaces as [`crate::Error::Io`] instead of being lost on close.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_json_bytes()?;
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}
