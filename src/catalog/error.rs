//! Error types for the catalog listing call.

use thiserror::Error;

/// The listing endpoint could not be reached or returned unusable content.
///
/// Any variant is fatal to the run: nothing is downloaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog URL is malformed.
    #[error("catalog unavailable: invalid URL {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The client's connect or read timeout elapsed.
    #[error("catalog unavailable: timed out fetching {url}")]
    Timeout {
        /// The listing URL.
        url: String,
    },

    /// Transport failure (DNS, connect, TLS, reset).
    #[error("catalog unavailable: network error fetching {url}: {source}")]
    Network {
        /// The listing URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The listing endpoint answered with a non-success status.
    #[error("catalog unavailable: HTTP {status} from {url}")]
    HttpStatus {
        /// The listing URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body was not the expected JSON shape.
    #[error("catalog unavailable: could not decode response from {url}: {source}")]
    Decode {
        /// The listing URL.
        url: String,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates a network error from a reqwest error.
    ///
    /// Client timeouts become [`CatalogError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display_names_the_condition() {
        let error = CatalogError::http_status("https://example.com/api/models", 503);
        let msg = error.to_string();
        assert!(msg.starts_with("catalog unavailable"), "got: {msg}");
        assert!(msg.contains("503"), "got: {msg}");

        let error = CatalogError::Timeout {
            url: "https://example.com/api/models".to_string(),
        };
        assert!(error.to_string().starts_with("catalog unavailable: timed out"));

        let error = CatalogError::invalid_url("::");
        assert!(error.to_string().contains("invalid URL ::"));
    }

    #[test]
    fn test_catalog_error_decode_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = CatalogError::decode("https://example.com/api/models", source);
        assert!(error.to_string().contains("could not decode"));
    }
}
