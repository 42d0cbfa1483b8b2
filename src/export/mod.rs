//! Export driver
//!
//! Walks the API in a fixed order and never goes back:
//!
//! 1. list packages
//! 2. per exportable package, list the active stage
//! 3. per exportable stage entry, fetch its content
//! 4. write the package bundle if it holds at least one file
//!
//! The first error aborts the whole run. Bundles already written stay on disk.

mod bundle;

#[cfg(test)]
mod tests;

pub use bundle::{BUNDLE_EXTENSION, Bundle, bundle_file_name};

use crate::api::{ApiClient, Package};
use crate::error::Result;
use crate::transport::Transport;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of a successful export run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Packages listed by the API
    pub packages: usize,
    /// Packages skipped for lacking a name or an active stage
    pub skipped: usize,
    /// Files written across all bundles
    pub files: usize,
    /// Bundle files written, in package order
    pub bundles: Vec<PathBuf>,
}

/// Drives one export from the API into `output_dir`
pub struct Exporter<T> {
    api: ApiClient<T>,
    output_dir: PathBuf,
}

impl<T: Transport> Exporter<T> {
    /// Create an exporter writing bundles into `output_dir`
    pub fn new(api: ApiClient<T>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
        }
    }

    /// Directory bundles are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Export every package with an active stage
    pub async fn run(&self) -> Result<ExportSummary> {
        let packages = self.api.list_packages().await?;
        let mut summary = ExportSummary {
            packages: packages.len(),
            ..ExportSummary::default()
        };

        for package in &packages {
            if !package.is_exportable() {
                debug!(
                    package = %package.name,
                    stage = %package.active_stage,
                    "skipping package without name or active stage"
                );
                summary.skipped += 1;
                continue;
            }

            if let Some(path) = self.export_package(package, &mut summary).await? {
                summary.bundles.push(path);
            }
        }

        info!(
            packages = summary.packages,
            skipped = summary.skipped,
            bundles = summary.bundles.len(),
            files = summary.files,
            "export finished"
        );
        Ok(summary)
    }

    /// Collect the exportable files of the package's active stage
    pub async fn collect_bundle(&self, package: &Package) -> Result<Bundle> {
        let entries = self
            .api
            .list_stage_files(&package.name, &package.active_stage)
            .await?;

        let mut bundle = Bundle::new();
        for entry in entries.iter().filter(|entry| entry.is_exportable()) {
            let content = self
                .api
                .fetch_file(&package.name, &package.active_stage, &entry.name)
                .await?;
            bundle.insert(entry.name.as_str(), &content);
        }
        Ok(bundle)
    }

    async fn export_package(
        &self,
        package: &Package,
        summary: &mut ExportSummary,
    ) -> Result<Option<PathBuf>> {
        let bundle = self.collect_bundle(package).await?;
        if bundle.is_empty() {
            debug!(package = %package.name, "no files to export");
            return Ok(None);
        }

        let path = self.output_dir.join(bundle_file_name(&package.name));
        bundle.write_to(&path).await?;
        summary.files += bundle.len();

        info!(
            package = %package.name,
            stage = %package.active_stage,
            files = bundle.len(),
            path = %path.display(),
            "wrote bundle"
        );
        Ok(Some(path))
    }
}
