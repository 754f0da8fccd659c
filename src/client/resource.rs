//! FHIR resource client
//!
//! # Overview
//!
//! CRUD and search operations against a FHIR R4 server. Each operation maps
//! onto one REST interaction and classifies failures through the transport
//! layer, so callers match on [`RosettaError`] variants rather than raw
//! status codes.
//!
//! # Example
//!
//! ```rust,no_run
//! use rosetta::client::ResourceClient;
//! use rosetta::config::ServerConfig;
//!
//! # async fn example() -> rosetta::domain::Result<()> {
//! let config = ServerConfig::new("https://hapi.fhir.org/baseR4");
//! let client = ResourceClient::new(&config)?;
//! let patient = client.read("Patient", "example").await?;
//! println!("{patient}");
//! # Ok(())
//! # }
//! ```

use crate::client::models::Bundle;
use crate::client::transport::HttpTransport;
use crate::config::ServerConfig;
use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use crate::domain::result::Result;

/// Client for FHIR resource CRUD and search
///
/// Cloning is cheap and shares the underlying connection pool. Dropping the
/// last clone closes idle connections, there is no separate shutdown call.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    transport: HttpTransport,
}

impl ResourceClient {
    /// Creates a client for the given server
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Configuration`] if the base URL is invalid or
    /// the underlying HTTP client cannot be constructed.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Builds a client on an existing transport
    pub(crate) fn with_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// The server base URL this client talks to
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Whether requests carry basic auth credentials
    pub fn is_authenticated(&self) -> bool {
        self.transport.is_authenticated()
    }

    /// Creates a resource on the server
    ///
    /// Posts to the type endpoint and returns the stored resource, which
    /// carries the server-assigned id and version.
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] if the server rejects the
    /// resource, or [`RosettaError::Protocol`] if the response body is not
    /// a resource.
    pub async fn create(&self, resource: &Resource) -> Result<Resource> {
        let resource_type = resource.resource_type();
        require_non_empty(resource_type, "resource type")?;

        tracing::debug!(resource_type, "Creating resource");
        let body = self.transport.post(resource_type, resource.as_value()).await?;
        let created = Resource::from_response(body)?;
        tracing::info!(
            resource_type,
            id = created.id().unwrap_or("unknown"),
            "Resource created"
        );
        Ok(created)
    }

    /// Reads a resource by type and id
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::ResourceNotFound`] if no such resource exists.
    pub async fn read(&self, resource_type: &str, id: &str) -> Result<Resource> {
        require_non_empty(resource_type, "resource type")?;
        require_non_empty(id, "resource id")?;

        tracing::debug!(resource_type, id, "Reading resource");
        let body = self
            .transport
            .get(&format!("{resource_type}/{id}"), &[])
            .await?;
        Resource::from_response(body)
    }

    /// Updates a resource in place
    ///
    /// The resource must carry an id; the update goes to that id's endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] if the resource has no id, and
    /// [`RosettaError::ResourceNotFound`] if the server knows no resource
    /// under that id.
    pub async fn update(&self, resource: &Resource) -> Result<Resource> {
        let resource_type = resource.resource_type();
        require_non_empty(resource_type, "resource type")?;
        let id = resource.id().ok_or_else(|| {
            RosettaError::validation("Cannot update a resource without an id")
        })?;

        tracing::debug!(resource_type, id, "Updating resource");
        let body = self
            .transport
            .put(&format!("{resource_type}/{id}"), resource.as_value())
            .await?;
        let updated = Resource::from_response(body)?;
        tracing::info!(resource_type, id, "Resource updated");
        Ok(updated)
    }

    /// Deletes a resource by type and id
    ///
    /// Returns `true` on successful deletion.
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::ResourceNotFound`] if no such resource exists.
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<bool> {
        require_non_empty(resource_type, "resource type")?;
        require_non_empty(id, "resource id")?;

        tracing::debug!(resource_type, id, "Deleting resource");
        let status = self
            .transport
            .delete(&format!("{resource_type}/{id}"))
            .await?;
        tracing::info!(resource_type, id, status = status.as_u16(), "Resource deleted");
        Ok(status.is_success())
    }

    /// Searches resources of a type
    ///
    /// `params` are passed through as query parameters. An empty result is
    /// a valid bundle with no entries, not an error.
    ///
    /// # Arguments
    ///
    /// * `resource_type` - FHIR resource type, e.g. `Patient`
    /// * `params` - search parameters, e.g. `[("name", "Smith")]`
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] if the server rejects a search
    /// parameter, or [`RosettaError::Protocol`] if the response is not a
    /// Bundle.
    pub async fn search(&self, resource_type: &str, params: &[(&str, &str)]) -> Result<Bundle> {
        require_non_empty(resource_type, "resource type")?;

        let query: Vec<(&str, String)> = params
            .iter()
            .map(|(name, value)| (*name, (*value).to_string()))
            .collect();

        tracing::debug!(resource_type, params = query.len(), "Searching resources");
        let body = self.transport.get(resource_type, &query).await?;
        let bundle = Bundle::from_response(body)?;
        tracing::debug!(resource_type, total = bundle.total(), "Search complete");
        Ok(bundle)
    }

    /// Fetches the server's CapabilityStatement
    ///
    /// Useful as a connectivity and feature probe before real traffic.
    pub async fn capability_statement(&self) -> Result<Resource> {
        tracing::debug!(base_url = self.base_url(), "Fetching capability statement");
        let body = self.transport.get("metadata", &[]).await?;
        Resource::from_response(body)
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RosettaError::validation(format!("Missing {what}")));
    }
    Ok(())
}
