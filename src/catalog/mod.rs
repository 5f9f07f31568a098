//! Catalog listing: one GET to the listing endpoint, decoded into entries.
//!
//! The endpoint returns
//! `{ "data": [ { "models": [ { "img": .., "thumb": .., "modelUrl": .. } ] } ] }`.
//! Categories are flattened; each model becomes one [`CatalogEntry`].
//! Missing, `null` and empty-string references are all treated as absent.

mod error;

pub use error::CatalogError;

use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::download::{AssetKind, HttpClient};

/// One catalog item with up to three upstream-relative asset references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Preview image reference.
    pub img: Option<String>,
    /// Thumbnail reference.
    pub thumb: Option<String>,
    /// Model payload reference.
    pub model_url: Option<String>,
}

impl CatalogEntry {
    /// Returns the reference for `kind`, if present.
    #[must_use]
    pub fn reference(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::Image => self.img.as_deref(),
            AssetKind::Thumbnail => self.thumb.as_deref(),
            AssetKind::Model => self.model_url.as_deref(),
        }
    }

    /// Iterates over the present references in kind order.
    pub fn references(&self) -> impl Iterator<Item = (AssetKind, &str)> {
        AssetKind::ALL
            .into_iter()
            .filter_map(|kind| self.reference(kind).map(|reference| (kind, reference)))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    data: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    models: Option<Vec<RawModel>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModel {
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    model_url: Option<String>,
}

impl From<RawModel> for CatalogEntry {
    fn from(raw: RawModel) -> Self {
        Self {
            img: non_empty(raw.img),
            thumb: non_empty(raw.thumb),
            model_url: non_empty(raw.model_url),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decodes a listing response body into catalog entries.
///
/// # Errors
///
/// Returns [`CatalogError::Decode`] if the body is not the expected shape.
pub fn parse_catalog(url: &str, body: &[u8]) -> Result<Vec<CatalogEntry>, CatalogError> {
    let response: CatalogResponse =
        serde_json::from_slice(body).map_err(|e| CatalogError::decode(url, e))?;

    Ok(response
        .data
        .into_iter()
        .flat_map(|category| category.models.unwrap_or_default())
        .map(CatalogEntry::from)
        .collect())
}

/// Client for the catalog listing endpoint.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
}

impl CatalogClient {
    /// Reuses the transfer client's connection pool and timeouts.
    #[must_use]
    pub fn new(http: &HttpClient) -> Self {
        Self {
            client: http.inner().clone(),
        }
    }

    /// Fetches and decodes the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the URL is invalid, the request fails,
    /// the endpoint answers with a non-success status, or the body cannot
    /// be decoded.
    #[instrument(skip(self, catalog_url), fields(url = %catalog_url))]
    pub async fn fetch(&self, catalog_url: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        Url::parse(catalog_url).map_err(|_| CatalogError::invalid_url(catalog_url))?;

        let response = self
            .client
            .get(catalog_url)
            .send()
            .await
            .map_err(|e| CatalogError::network(catalog_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(catalog_url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::network(catalog_url, e))?;
        debug!(bytes = body.len(), "catalog body received");

        let entries = parse_catalog(catalog_url, &body)?;
        info!(entries = entries.len(), "catalog fetched");
        Ok(entries)
    }
}
