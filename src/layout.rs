//! Output directory layout: a root with one subdirectory per asset kind.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::download::AssetKind;
use crate::report::REPORT_FILE_NAME;

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "./downloaded_models";

/// Directory bootstrap failed; fatal before any transfer starts.
#[derive(Debug, Error)]
#[error("could not create output directory {path}: {source}")]
pub struct LayoutError {
    /// Directory that could not be created.
    pub path: PathBuf,
    /// The underlying IO error.
    #[source]
    pub source: std::io::Error,
}

/// Root directory plus the `img/`, `thumb/` and `models/` subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates a layout rooted at `root`. Nothing is touched on disk.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subdirectory dedicated to `kind`.
    #[must_use]
    pub fn dir_for(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Location of the failure report.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE_NAME)
    }

    /// Creates the root and every kind subdirectory if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] naming the first directory that could not be
    /// created.
    pub async fn ensure_dirs(&self) -> Result<(), LayoutError> {
        for dir in std::iter::once(self.root.clone())
            .chain(AssetKind::ALL.into_iter().map(|kind| self.dir_for(kind)))
        {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| LayoutError {
                    path: dir.clone(),
                    source,
                })?;
            debug!(dir = %dir.display(), "output directory ready");
        }
        Ok(())
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}
