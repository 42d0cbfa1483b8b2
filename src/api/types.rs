//! Response types of the configuration-management API

use crate::utils::has_path_separator;
use serde::{Deserialize, Serialize};

/// Envelope every list endpoint wraps its items in
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Results<T> {
    /// Listed items
    #[serde(default)]
    pub results: Vec<T>,
}

/// A config package as listed by `GET /v1/config/packages`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    /// Package name
    #[serde(default)]
    pub name: String,
    /// Stage currently active for this package (empty if none)
    #[serde(default, rename = "active-stage")]
    pub active_stage: String,
}

impl Package {
    /// Returns `true` if the package has both a name and an active stage
    pub fn is_exportable(&self) -> bool {
        !self.name.is_empty() && !self.active_stage.is_empty()
    }
}

/// Kind of a stage entry
pub const FILE_TYPE: &str = "file";

/// One entry of a stage listing (`GET /v1/config/stages/{package}/{stage}`)
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageFile {
    /// Path of the entry relative to the stage root
    #[serde(default)]
    pub name: String,
    /// Entry type: `file`, `directory`, ...
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl StageFile {
    /// Returns `true` for plain files below a directory of the stage
    ///
    /// Top-level entries (no separator in the name) are stage metadata such
    /// as `include.conf` and are not exported.
    pub fn is_exportable(&self) -> bool {
        self.kind == FILE_TYPE && has_path_separator(&self.name)
    }
}
