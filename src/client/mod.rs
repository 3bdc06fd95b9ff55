//! HTTP client for the Flowdapt REST API.
//!
//! The client only owns transport: URL building, the API version header, JSON
//! encoding and the mapping of HTTP failures onto [`ClientError`]. Which
//! endpoint belongs to which resource kind lives in `crate::resources`.
pub mod errors;

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

pub use errors::ClientError;

use crate::types::{MetricsQuery, MetricsResponse, RunOptions, ServerInfo, SystemStatus, WorkflowRun};

/// Header carrying the schema version a request is made against.
pub const API_VERSION_HEADER: &str = "X-API-Version";

/// Schema version used for endpoints that are not tied to a resource kind.
pub const SYSTEM_API_VERSION: &str = "v1alpha1";

/// Seconds to wait for a TCP connection before giving up.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Query string pairs appended to a request URL.
pub type Query<'a> = &'a [(&'a str, String)];

/// Async client bound to a single Flowdapt server.
#[derive(Debug, Clone)]
pub struct FlowdaptClient {
    base_url: Url,
    http: reqwest::Client,
}

impl FlowdaptClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` for URLs that cannot carry a path
    /// (e.g. `mailto:`), or `ClientError::Build` if the TLS backend fails.
    pub fn new(base_url: &Url) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("flowctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;

        debug!("Created client for {base_url}");

        Ok(Self {
            base_url: base_url.clone(),
            http,
        })
    }

    /// Build a request URL from path segments. A trailing empty segment
    /// produces a trailing slash (collection endpoints).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidBaseUrl` if the base URL cannot carry a path.
    pub fn url(&self, segments: &[&str], query: Query<'_>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidBaseUrl(self.base_url.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// `GET` a JSON document.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn get(
        &self,
        segments: &[&str],
        version: &str,
        query: Query<'_>,
    ) -> Result<Value, ClientError> {
        let url = self.url(segments, query)?;
        self.execute(Method::GET, url, version, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn post(
        &self,
        segments: &[&str],
        version: &str,
        query: Query<'_>,
        body: &Value,
    ) -> Result<Value, ClientError> {
        let url = self.url(segments, query)?;
        self.execute(Method::POST, url, version, Some(body)).await
    }

    /// `PUT` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn put(
        &self,
        segments: &[&str],
        version: &str,
        body: &Value,
    ) -> Result<Value, ClientError> {
        let url = self.url(segments, &[])?;
        self.execute(Method::PUT, url, version, Some(body)).await
    }

    /// `DELETE` a resource, returning whatever the server echoes back.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn delete(&self, segments: &[&str], version: &str) -> Result<Value, ClientError> {
        let url = self.url(segments, &[])?;
        self.execute(Method::DELETE, url, version, None).await
    }

    #[instrument(skip_all, fields(%method, %url, version = %version))]
    async fn execute(
        &self,
        method: Method,
        url: Url,
        version: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut request: RequestBuilder = self
            .http
            .request(method, url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(API_VERSION_HEADER, version);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("Sending request");

        let response = request.send().await.map_err(|source| ClientError::Connection {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ClientError::Connection {
            url: url.to_string(),
            source,
        })?;

        debug!(status = status.as_u16(), bytes = text.len(), "Received response");

        if !status.is_success() {
            if status != reqwest::StatusCode::NOT_FOUND {
                warn!(status = status.as_u16(), "Request failed");
            }
            return Err(ClientError::from_status(status, url.path(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn decode<T: DeserializeOwned>(&self, segments: &[&str], value: Value) -> Result<T, ClientError> {
        serde_json::from_value(value).map_err(|source| ClientError::Decode {
            url: self
                .url(segments, &[])
                .map_or_else(|_| segments.join("/"), |u| u.to_string()),
            source,
        })
    }

    /// Server version information.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn ping(&self) -> Result<ServerInfo, ClientError> {
        let segments = ["api", "ping"];
        let value = self.get(&segments, SYSTEM_API_VERSION, &[]).await?;
        self.decode(&segments, value)
    }

    /// Host and service status of the server.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn system_status(&self) -> Result<SystemStatus, ClientError> {
        let segments = ["api", "system", "status"];
        let value = self.get(&segments, SYSTEM_API_VERSION, &[]).await?;
        self.decode(&segments, value)
    }

    /// Fetch recorded data points for a metric.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn metrics(&self, query: &MetricsQuery) -> Result<MetricsResponse, ClientError> {
        let segments = ["api", "metrics", ""];
        let params = query.to_query();
        let value = self.get(&segments, &query.version, &params).await?;
        if value.is_null() {
            return Ok(MetricsResponse::default());
        }
        self.decode(&segments, value)
    }

    /// Execute a workflow by UID or name.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn run_workflow(
        &self,
        identifier: &str,
        input: &Value,
        opts: &RunOptions,
    ) -> Result<WorkflowRun, ClientError> {
        let segments = ["api", "workflows", identifier, "run"];
        let mut params = vec![("wait", opts.wait.to_string())];
        if let Some(namespace) = &opts.namespace {
            params.push(("namespace", namespace.clone()));
        }
        let value = self.post(&segments, &opts.version, &params, input).await?;
        self.decode(&segments, value)
    }
}
