/// Typed response and request shapes for the endpoints flowctl interprets.
///
/// Resource records (workflows, configs, ...) stay as `serde_json::Value`
/// since flowctl only displays them. The types here are the responses that
/// commands compute with: run state, system status and metric points.
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Timestamp format sent for metric time bounds.
pub const QUERY_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Server identification returned by the ping endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server release version.
    #[serde(default)]
    pub version: Option<String>,
    /// REST API version.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Host and service status of a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Server instance name.
    pub name: String,
    /// Host resource usage.
    pub system: SystemMetrics,
    /// Host operating system.
    pub os: OsInfo,
    /// Service name to status object (`{"status": "OK", ...}`), in server order.
    #[serde(default)]
    pub services: Map<String, Value>,
}

/// Host resource usage snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Server-side timestamp of the snapshot.
    pub time: Value,
    /// CPU utilisation in percent.
    pub cpu_pct: f64,
    /// Memory in use, in bytes.
    pub memory: f64,
    /// Disk utilisation in percent.
    pub disk_pct: f64,
    /// Bytes sent over the network.
    pub network_io_sent: f64,
    /// Bytes received over the network.
    pub network_io_recv: f64,
}

/// Host operating system description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub name: String,
    pub release: String,
    pub machine: String,
}

/// A single workflow execution as returned by the run endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub uid: String,
    pub name: String,
    /// Lifecycle state: `pending`, `running`, `finished`, `failed`, ...
    pub state: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    /// Workflow output, `null` while unfinished.
    #[serde(default)]
    pub result: Value,
}

/// Options for executing a workflow.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Block until the run reaches a terminal state.
    pub wait: bool,
    /// Namespace to execute in; server default when `None`.
    pub namespace: Option<String>,
    /// Schema version of the returned run.
    pub version: String,
}

/// Query for recorded metric points.
#[derive(Debug, Clone)]
pub struct MetricsQuery {
    /// Server-side metric name (e.g. `api_request_latency`).
    pub name: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    /// Maximum number of points; unlimited when `None`.
    pub max_length: Option<u64>,
    pub version: String,
}

impl MetricsQuery {
    /// Query string pairs for this request.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("name", self.name.clone())];
        if let Some(start) = self.start_time {
            params.push(("start_time", start.format(QUERY_DATETIME_FORMAT).to_string()));
        }
        if let Some(end) = self.end_time {
            params.push(("end_time", end.format(QUERY_DATETIME_FORMAT).to_string()));
        }
        if let Some(max) = self.max_length {
            params.push(("max_length", max.to_string()));
        }
        params
    }
}

/// Metric name to recorded points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsResponse(pub BTreeMap<String, Vec<MetricPoint>>);

/// One recorded metric point. Gauges and sums carry `value`; histograms
/// carry `explicit_bounds` and `bucket_counts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricPoint {
    #[serde(default)]
    pub time_unix_nano: Option<u64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub explicit_bounds: Vec<f64>,
    #[serde(default)]
    pub bucket_counts: Vec<u64>,
}
