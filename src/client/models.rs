//! FHIR Bundle models
//!
//! Response structures for search results. These models capture the Bundle
//! envelope fields Rosetta needs and leave each entry's resource opaque.

use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A FHIR Bundle, as returned by search
///
/// An empty search result is a perfectly valid bundle: `total` is zero and
/// `entry` is absent. Paging links, when the server provides them, are kept
/// in `link` for callers that walk result pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,

    /// Bundle type, e.g. `searchset`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    /// Server-reported total number of matches across all pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link: Vec<BundleLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

/// A paging or self link on a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

/// One entry in a bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
}

impl Bundle {
    /// Parses a bundle out of a response body
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Protocol`] if the body is not a Bundle.
    pub fn from_response(value: Value) -> Result<Self> {
        let bundle: Bundle = serde_json::from_value(value)?;
        if bundle.resource_type != "Bundle" {
            return Err(RosettaError::Protocol(format!(
                "Expected a Bundle, got '{}'",
                bundle.resource_type
            )));
        }
        Ok(bundle)
    }

    /// Total number of matches across all pages
    ///
    /// Falls back to the entry count when the server omits `total`.
    pub fn total(&self) -> u64 {
        self.total.unwrap_or(self.entry.len() as u64)
    }

    /// Number of entries on this page
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    /// Whether this page carries no entries
    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    /// Iterates over the resources carried by this page's entries
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entry.iter().filter_map(|entry| entry.resource.as_ref())
    }

    /// Consumes the bundle, returning this page's resources
    pub fn into_resources(self) -> Vec<Resource> {
        self.entry
            .into_iter()
            .filter_map(|entry| entry.resource)
            .collect()
    }

    /// The URL of the named paging link (`next`, `previous`, `self`)
    pub fn link(&self, relation: &str) -> Option<&str> {
        self.link
            .iter()
            .find(|link| link.relation == relation)
            .map(|link| link.url.as_str())
    }
}
