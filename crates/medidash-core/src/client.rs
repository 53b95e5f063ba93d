//! HTTP client for the dashboard's read-only JSON data source.
//!
//! One GET per call, no retries. Transport failures surface as
//! [`FetchError::Network`]; the server answering with a non-2xx status or an
//! unparseable body surfaces as [`FetchError::Status`] / [`FetchError::Decode`].

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{FetchError, Result};
use crate::model::{Appointment, ChartData, Metrics, Patient};

/// Public demo instance the dashboard was built against.
pub const DEFAULT_BASE_URL: &str = "https://json-server-hpku.onrender.com";

/// Collections exposed by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Patients,
    Appointments,
    Metrics,
    Charts,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Appointments => "appointments",
            Self::Metrics => "metrics",
            Self::Charts => "charts",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Cache key: a resource plus the query parameters that shape its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub resource: Resource,
    pub limit: Option<u32>,
}

impl ResourceKey {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        self.limit
            .map(|n| vec![("_limit", n.to_string())])
            .unwrap_or_default()
    }
}

impl From<Resource> for ResourceKey {
    fn from(resource: Resource) -> Self {
        Self::new(resource)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.limit {
            Some(n) => write!(f, "{}?_limit={n}", self.resource),
            None => write!(f, "{}", self.resource),
        }
    }
}

/// Configuration for [`DashboardClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Unset by default: a hung request stays pending.
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid URL"))
    }
}

/// Thin typed wrapper over `reqwest` for the dashboard endpoints.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| FetchError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url, resource.path())
    }

    /// Issues a single GET for `key` and decodes the JSON body as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &ResourceKey) -> Result<T> {
        let url = self.resource_url(key.resource);
        tracing::debug!(key = %key, url = %url, "Fetching resource");

        let resp = self
            .http
            .get(&url)
            .query(&key.query_params())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Request failed");
                FetchError::network(e.to_string())
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(key = %key, status = status.as_u16(), "Non-success response");
            return Err(FetchError::status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(key = %key, error = %e, "Failed to parse response JSON");
            FetchError::decode(e.to_string())
        })
    }

    pub async fn patients(&self, limit: Option<u32>) -> Result<Vec<Patient>> {
        self.get(&ResourceKey::new(Resource::Patients).with_limit(limit))
            .await
    }

    pub async fn appointments(&self, limit: Option<u32>) -> Result<Vec<Appointment>> {
        self.get(&ResourceKey::new(Resource::Appointments).with_limit(limit))
            .await
    }

    pub async fn metrics(&self) -> Result<Metrics> {
        self.get(&ResourceKey::new(Resource::Metrics)).await
    }

    pub async fn charts(&self) -> Result<ChartData> {
        self.get(&ResourceKey::new(Resource::Charts)).await
    }
}
