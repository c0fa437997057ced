use crate::errors::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `[unix timestamp, value]` sample. Both halves are floats because the
/// API accepts fractional timestamps and non-integer values.
///
/// Query results use `null` for gaps in a series; a `null` half decodes as
/// `0.0`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(from = "WirePoint")]
pub struct DataPoint(pub f64, pub f64);

#[derive(Deserialize)]
struct WirePoint(Option<f64>, Option<f64>);

impl From<WirePoint> for DataPoint {
    fn from(point: WirePoint) -> Self {
        DataPoint(point.0.unwrap_or(0.0), point.1.unwrap_or(0.0))
    }
}

impl DataPoint {
    pub fn new(timestamp: f64, value: f64) -> Self {
        DataPoint(timestamp, value)
    }

    pub fn now(value: f64) -> Self {
        DataPoint(Utc::now().timestamp() as f64, value)
    }

    pub fn timestamp(&self) -> f64 {
        self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }
}

/// One series to submit. Contents are passed to the server as-is.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Metric {
    pub metric: String,
    pub points: Vec<DataPoint>,
    #[serde(rename = "type")]
    pub metric_type: String,
    pub host: String,
    pub tags: Vec<String>,
}

impl Metric {
    pub fn new(metric: &str, metric_type: &str) -> Self {
        Self {
            metric: metric.to_string(),
            metric_type: metric_type.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SeriesRequest<'a> {
    pub series: &'a [Metric],
}

impl<'a> SeriesRequest<'a> {
    /// JSON has no NaN or infinity; serde_json would silently write `null`.
    pub fn new(series: &'a [Metric]) -> Result<Self, ClientError> {
        for metric in series {
            if let Some(point) = metric.points.iter().find(|p| !p.is_finite()) {
                return Err(ClientError::NonFiniteValue {
                    metric: metric.metric.clone(),
                    timestamp: point.timestamp(),
                    value: point.value(),
                });
            }
        }
        Ok(SeriesRequest { series })
    }
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SeriesResponse {
    #[serde(default)]
    pub series: Vec<RawQuerySeries>,
}

/// A query result exactly as it appears on the wire.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RawQuerySeries {
    pub expression: String,
    pub metric: String,
    pub aggr: String,
    pub scope: String,
    pub start: i64,
    pub end: i64,
    pub pointlist: Vec<DataPoint>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuerySeries {
    pub expression: String,
    pub metric: String,
    pub aggr: String,
    pub scope: BTreeMap<String, String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub pointlist: Vec<DataPoint>,
}

impl TryFrom<RawQuerySeries> for QuerySeries {
    type Error = ClientError;

    fn try_from(raw: RawQuerySeries) -> Result<Self, Self::Error> {
        Ok(QuerySeries {
            scope: parse_scope(&raw.scope)?,
            start: from_unix(raw.start)?,
            end: from_unix(raw.end)?,
            expression: raw.expression,
            metric: raw.metric,
            aggr: raw.aggr,
            pointlist: raw.pointlist,
        })
    }
}

/// Parses `"k1:v1,k2:v2"` into a map. An empty scope and the wildcard `*`
/// both mean "no dimensions". Later keys overwrite earlier ones.
pub fn parse_scope(scope: &str) -> Result<BTreeMap<String, String>, ClientError> {
    let mut result = BTreeMap::new();
    if scope.is_empty() || scope == "*" {
        return Ok(result);
    }

    for segment in scope.split(',') {
        let parts: Vec<&str> = segment.split(':').collect();
        if parts.len() != 2 {
            return Err(ClientError::MalformedScope(segment.to_string()));
        }
        result.insert(parts[0].to_string(), parts[1].to_string());
    }

    Ok(result)
}

pub fn from_unix(secs: i64) -> Result<DateTime<Utc>, ClientError> {
    DateTime::from_timestamp(secs, 0).ok_or(ClientError::InvalidTimestamp(secs))
}
