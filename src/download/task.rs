//! Transfer tasks: what to fetch, where it lands, and how it settled.
//!
//! Also home to the two pre-dispatch helpers, [`resolve_destination`] (pure
//! path derivation) and [`destination_exists`] (the skip check).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The three asset kinds a catalog entry can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    /// Preview image.
    #[serde(rename = "img")]
    Image,
    /// Thumbnail.
    #[serde(rename = "thumb")]
    Thumbnail,
    /// Primary model payload.
    #[serde(rename = "model")]
    Model,
}

impl AssetKind {
    /// All kinds, in the order they are expanded from an entry.
    pub const ALL: [Self; 3] = [Self::Image, Self::Thumbnail, Self::Model];

    /// Subdirectory of the output root dedicated to this kind.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Image => "img",
            Self::Thumbnail => "thumb",
            Self::Model => "models",
        }
    }

    /// Short label used in logs and in the report `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "img",
            Self::Thumbnail => "thumb",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work: a single URL downloaded to a single local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    source_url: String,
    destination: PathBuf,
    kind: AssetKind,
    reference: String,
}

impl TransferTask {
    /// Builds the task for `reference` of the given `kind`.
    ///
    /// The source URL is `asset_host` joined with the upstream-relative
    /// reference; the destination comes from [`resolve_destination`].
    #[must_use]
    pub fn new(asset_host: &str, output_root: &Path, kind: AssetKind, reference: &str) -> Self {
        Self {
            source_url: join_asset_url(asset_host, reference),
            destination: resolve_destination(output_root, kind, reference),
            kind,
            reference: reference.to_string(),
        }
    }

    /// Absolute URL to fetch.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Final local path of the asset.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Asset kind.
    #[must_use]
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Upstream-relative reference the task was derived from.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Terminal state of one executed [`TransferTask`].
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// The file is in place under its final name.
    Success {
        /// The task that settled.
        task: TransferTask,
        /// Bytes written.
        bytes: u64,
    },
    /// Nothing was left under the final name.
    Failure {
        /// The task that settled.
        task: TransferTask,
        /// Human-readable reason.
        reason: String,
    },
}

/// Maps an asset reference to its local path under `base_dir`.
///
/// The filename is the last path segment of the reference (query and
/// fragment removed, percent-decoded), placed in the subdirectory for
/// `kind`. Two references sharing a basename and a kind map to the same
/// path.
#[must_use]
pub fn resolve_destination(base_dir: &Path, kind: AssetKind, reference: &str) -> PathBuf {
    base_dir.join(kind.dir_name()).join(asset_basename(reference))
}

/// Returns true when `path` already holds something.
///
/// An error while probing (permissions, broken parent) counts as absent;
/// the transfer then surfaces the real problem as its failure reason.
pub async fn destination_exists(path: &Path) -> bool {
    match tokio::fs::try_exists(path).await {
        Ok(exists) => exists,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "existence probe failed, treating as absent");
            false
        }
    }
}

fn join_asset_url(asset_host: &str, reference: &str) -> String {
    let host = asset_host.trim_end_matches('/');
    if reference.starts_with('/') {
        format!("{host}{reference}")
    } else {
        format!("{host}/{reference}")
    }
}

fn asset_basename(reference: &str) -> String {
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let last = path.rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    let name = sanitize_filename(&decoded);

    if name.is_empty() {
        fallback_basename(reference)
    } else {
        name
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim() {
        "." | ".." => String::new(),
        trimmed => trimmed.to_string(),
    }
}

// Stays total for references like "/" that have no usable last segment.
fn fallback_basename(reference: &str) -> String {
    let flattened: String = reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let flattened = flattened.trim_matches('_');
    if flattened.is_empty() {
        "asset".to_string()
    } else {
        flattened.to_string()
    }
}
