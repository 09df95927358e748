//! Clients of the device catalog and the topology storage service.
//!
//! Both services are consumed through traits so the editor can run against
//! the REST API ([`HttpClient`]) or an in-memory stand-in in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::StorageConfig;
use crate::device::DeviceRecord;
use crate::document::{
    DeviceListResponse, Envelope, TopologyId, TopologyPayload, TopologyRecord, TopologySummary,
};
use crate::error::{Error, Result};

/// Header carrying the CSRF token on mutating calls.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Read access to the device inventory.
pub trait DeviceCatalog {
    /// List the devices of the configured branch.
    fn list_devices(&self) -> impl Future<Output = Result<Vec<DeviceRecord>>> + Send;
}

/// REST CRUD over named topology documents.
pub trait TopologyStore {
    /// `GET topologies?branch_id=...`
    fn list(&self) -> impl Future<Output = Result<Vec<TopologySummary>>> + Send;

    /// `GET topologies/{id}`
    fn fetch(&self, id: TopologyId) -> impl Future<Output = Result<TopologyRecord>> + Send;

    /// `POST topologies`
    fn create(
        &self,
        payload: TopologyPayload,
    ) -> impl Future<Output = Result<TopologySummary>> + Send;

    /// `PUT topologies/{id}`
    fn update(
        &self,
        id: TopologyId,
        payload: TopologyPayload,
    ) -> impl Future<Output = Result<TopologySummary>> + Send;

    /// `DELETE topologies/{id}`
    fn delete(&self, id: TopologyId) -> impl Future<Output = Result<()>> + Send;
}

/// `reqwest`-backed client for both services.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    branch_id: u64,
    csrf_token: Option<String>,
}

impl HttpClient {
    /// Create a client from the storage configuration.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            branch_id: config.branch_id,
            csrf_token: config.csrf_token.clone(),
        })
    }

    pub fn branch_id(&self) -> u64 {
        self.branch_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Attach the CSRF header expected on mutating calls.
    fn mutating(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    /// Send a request and decode the storage envelope.
    ///
    /// Validation failures (422) still carry an envelope, so the body is
    /// decoded before the status is considered.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(http_failure(status, &body)),
            Err(e) => Err(Error::network(format!("Malformed response: {}", e))),
        }
    }
}

fn http_failure(status: StatusCode, body: &str) -> Error {
    let body = body.trim();
    if body.is_empty() {
        Error::network(format!("HTTP {}", status))
    } else {
        Error::network(format!("HTTP {}: {}", status, body))
    }
}

impl DeviceCatalog for HttpClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let response = self
            .http
            .get(self.url("devices"))
            .query(&[
                ("branch_id", self.branch_id.to_string()),
                ("per_page", "100".to_string()),
                ("page", "1".to_string()),
                ("include_inactive", "true".to_string()),
                ("active_filter", "all".to_string()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(http_failure(status, &body));
        }

        let list: DeviceListResponse = serde_json::from_str(&body)
            .map_err(|e| Error::network(format!("Malformed device list: {}", e)))?;
        if let Some(error) = list.error {
            return Err(Error::NetworkFailure(error));
        }

        tracing::debug!(count = list.data.len(), "Fetched device catalog");
        Ok(list.data)
    }
}

impl TopologyStore for HttpClient {
    async fn list(&self) -> Result<Vec<TopologySummary>> {
        let request = self
            .http
            .get(self.url("topologies"))
            .query(&[("branch_id", self.branch_id)]);
        let topologies: Vec<TopologySummary> = self.send(request).await?.into_data()?;
        tracing::debug!(count = topologies.len(), "Fetched topology list");
        Ok(topologies)
    }

    async fn fetch(&self, id: TopologyId) -> Result<TopologyRecord> {
        let request = self.http.get(self.url(&format!("topologies/{}", id)));
        self.send(request).await?.into_data()
    }

    async fn create(&self, mut payload: TopologyPayload) -> Result<TopologySummary> {
        payload.branch_id.get_or_insert(self.branch_id);
        let request = self
            .mutating(self.http.post(self.url("topologies")))
            .json(&payload);
        self.send(request).await?.into_data()
    }

    async fn update(&self, id: TopologyId, payload: TopologyPayload) -> Result<TopologySummary> {
        let request = self
            .mutating(self.http.put(self.url(&format!("topologies/{}", id))))
            .json(&payload);
        self.send(request).await?.into_data()
    }

    async fn delete(&self, id: TopologyId) -> Result<()> {
        let request = self.mutating(self.http.delete(self.url(&format!("topologies/{}", id))));
        self.send::<serde_json::Value>(request).await?.into_unit()
    }
}
