/// `metrics` command: fetch a server metric and plot or serialize it.
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use super::{Context, Outcome};
use crate::cli::args::{MetricsArgs, MetricsFormat};
use crate::errors::{FlowctlError, Result};
use crate::render::{PlotOptions, Serialization, histogram, line_plot, print_block, serialize};
use crate::types::{MetricPoint, MetricsQuery};

/// Schema version of the metrics endpoint.
const METRICS_VERSION: &str = "v1alpha1";

/// Time format for plotted samples.
const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The metrics `flowctl metrics` knows how to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Memory,
    ApiLatency,
}

impl Metric {
    /// Resolve a short metric name.
    ///
    /// # Errors
    ///
    /// Returns `FlowctlError::UnknownMetric` for any other name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "cpu" => Ok(Self::Cpu),
            "memory" => Ok(Self::Memory),
            "api_latency" => Ok(Self::ApiLatency),
            other => Err(FlowctlError::UnknownMetric(other.to_owned())),
        }
    }

    /// Name of the metric on the server.
    #[must_use]
    pub fn server_name(self) -> &'static str {
        match self {
            Self::Cpu => "process.runtime.cpython.cpu_time",
            Self::Memory => "process.runtime.cpython.memory",
            Self::ApiLatency => "api_request_latency",
        }
    }

    /// Process raw points into what gets displayed.
    #[must_use]
    pub fn process<Tz: TimeZone>(self, points: &[MetricPoint], tz: &Tz) -> Series
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Self::Cpu => Series::Samples(samples(points, "user", tz)),
            Self::Memory => Series::Samples(samples(points, "rss", tz)),
            Self::ApiLatency => points.last().map_or(Series::Empty, |latest| {
                Series::Histogram(
                    histogram_values(&latest.explicit_bounds, &latest.bucket_counts),
                    latest.explicit_bounds.len(),
                )
            }),
        }
    }

    fn y_label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU Utilization",
            Self::Memory => "Memory Utilization",
            Self::ApiLatency => "Number of Requests",
        }
    }
}

/// Processed metric data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Series {
    /// `(time, value)` pairs in server order.
    Samples(Vec<(String, f64)>),
    /// Repeated bucket midpoints and the number of bins to draw.
    Histogram(Vec<f64>, usize),
    Empty,
}

impl Series {
    fn is_empty(&self) -> bool {
        match self {
            Self::Samples(samples) => samples.is_empty(),
            Self::Histogram(values, _) => values.is_empty(),
            Self::Empty => true,
        }
    }
}

/// Run `metrics`.
///
/// # Errors
///
/// Returns `FlowctlError::UnknownMetric`, client failures and render errors.
pub async fn run(args: &MetricsArgs, ctx: &Context) -> Result<Outcome> {
    let metric = Metric::from_name(&args.name)?;
    let query = MetricsQuery {
        name: metric.server_name().to_owned(),
        start_time: args.start_time,
        end_time: args.end_time,
        max_length: u64::try_from(args.limit).ok(),
        version: METRICS_VERSION.to_owned(),
    };

    let client = ctx.client()?;
    let response = client.metrics(&query).await?;
    let points = response
        .0
        .get(metric.server_name())
        .map_or(&[][..], Vec::as_slice);
    let series = metric.process(points, &Local);

    let encoding = match args.format {
        MetricsFormat::Graph => {
            if let Some(plot) = plot(metric, &series)? {
                print_block(&plot);
            }
            return Ok(Outcome::Success);
        }
        MetricsFormat::Raw => Serialization::Raw,
        MetricsFormat::Json => Serialization::Json,
        MetricsFormat::Yaml => Serialization::Yaml,
    };
    print_block(&serialize(series_or_empty(&series), encoding)?);
    Ok(Outcome::Success)
}

fn series_or_empty(series: &Series) -> &Series {
    const NO_SAMPLES: &Series = &Series::Samples(Vec::new());
    if matches!(series, Series::Empty) { NO_SAMPLES } else { series }
}

/// Draw the series, or `None` when there is nothing to draw.
///
/// # Errors
///
/// Returns plot errors.
pub fn plot(metric: Metric, series: &Series) -> Result<Option<String>> {
    if series.is_empty() {
        return Ok(None);
    }
    let plotted = match series {
        Series::Samples(samples) => {
            let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
            let bounds = samples
                .first()
                .zip(samples.last())
                .map(|((first, _), (last, _))| (first.as_str(), last.as_str()));
            line_plot(&values, bounds, &PlotOptions::default().with_axes("Time", metric.y_label()))?
        }
        Series::Histogram(values, bins) => histogram(
            values,
            *bins,
            &PlotOptions::default().with_axes("Latency (ms)", metric.y_label()),
        )?,
        Series::Empty => return Ok(None),
    };
    Ok(Some(plotted))
}

fn samples<Tz: TimeZone>(points: &[MetricPoint], kind: &str, tz: &Tz) -> Vec<(String, f64)>
where
    Tz::Offset: std::fmt::Display,
{
    points
        .iter()
        .filter(|point| point.attributes.get("type").and_then(serde_json::Value::as_str) == Some(kind))
        .filter_map(|point| {
            let time = sample_time(point.time_unix_nano?, tz)?;
            Some((time, point.value?))
        })
        .collect()
}

/// Format a nanosecond timestamp, truncated to whole seconds, in `tz`.
fn sample_time<Tz: TimeZone>(nanos: u64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let secs = i64::try_from(nanos / 1_000_000_000).ok()?;
    let utc = DateTime::from_timestamp(secs, 0)?;
    Some(utc.with_timezone(tz).format(SAMPLE_TIME_FORMAT).to_string())
}

/// Expand histogram buckets into values: each bucket contributes its midpoint
/// once per count, and the last bucket uses the last bound.
#[must_use]
pub fn histogram_values(bounds: &[f64], counts: &[u64]) -> Vec<f64> {
    let Some(&last_bound) = bounds.last() else {
        return Vec::new();
    };
    counts
        .iter()
        .enumerate()
        .flat_map(|(i, &count)| {
            let midpoint = match (bounds.get(i), bounds.get(i + 1)) {
                (Some(lo), Some(hi)) => (lo + hi) / 2.0,
                _ => last_bound,
            };
            std::iter::repeat_n(midpoint, usize::try_from(count).unwrap_or(usize::MAX))
        })
        .collect()
}
