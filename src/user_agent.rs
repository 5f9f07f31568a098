//! User-Agent string shared by the catalog and transfer requests.

/// Default User-Agent (identifies the tool and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("model-fetcher/{version} (catalog-mirror)")
}
