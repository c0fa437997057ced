use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::metrics::{Metric, QuerySeries, SeriesRequest, SeriesResponse};
use crate::transport::{HttpTransport, JsonTransport};
use chrono::{DateTime, Utc};
use reqwest::Method;

pub const SERIES_PATH: &str = "/v1/series";
pub const QUERY_PATH: &str = "/v1/query";

pub struct Client<T: JsonTransport> {
    transport: T,
}

impl Client<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Ok(Client {
            transport: HttpTransport::new(config)?,
        })
    }
}

impl<T: JsonTransport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Client { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submits `series` as-is. An empty slice is still sent.
    pub async fn post_metrics(&self, series: &[Metric]) -> Result<(), ClientError> {
        let request = SeriesRequest::new(series)?;
        let body = serde_json::to_value(request).map_err(ClientError::Encode)?;
        log::debug!("posting {} series", series.len());
        self.transport
            .request(Method::POST, SERIES_PATH, Some(body))
            .await?;
        Ok(())
    }

    /// Runs `query` over `[start, end]`. Any undecodable series fails the
    /// whole call.
    pub async fn query_metrics(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<QuerySeries>, ClientError> {
        let path = format!("{}?{}", QUERY_PATH, query_string(query, start, end));
        let value = self.transport.request(Method::GET, &path, None).await?;
        let response: SeriesResponse = serde_json::from_value(value).map_err(ClientError::Decode)?;

        response
            .series
            .into_iter()
            .map(QuerySeries::try_from)
            .collect()
    }
}

pub fn query_string(query: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("start", &start.timestamp().to_string())
        .append_pair("to", &end.timestamp().to_string())
        .append_pair("query", query)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DataPoint;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedRequest {
        method: Method,
        path: String,
        body: Option<Value>,
    }

    struct MockTransport {
        response: Result<Value, u16>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        fn new(response: Value) -> Self {
            Self {
                response: Ok(response),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl JsonTransport for MockTransport {
        async fn request(
            &self,
            method: Method,
            path: &str,
            body: Option<Value>,
        ) -> Result<Value, ClientError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method,
                path: path.to_string(),
                body,
            });
            match &self.response {
                Ok(v) => Ok(v.clone()),
                Err(status) => Err(ClientError::Status {
                    status: *status,
                    body: String::new(),
                }),
            }
        }
    }

    fn sample_metrics() -> Vec<Metric> {
        vec![
            Metric {
                metric: "app.requests".to_string(),
                points: vec![DataPoint::new(1700000000.0, 3.0), DataPoint::new(1700000010.5, 4.25)],
                metric_type: "counter".to_string(),
                host: "web-1".to_string(),
                tags: vec!["env:prod".to_string(), "team:core".to_string()],
            },
            Metric::new("app.idle", "gauge"),
        ]
    }

    #[tokio::test]
    async fn test_post_metrics() {
        let client = Client::with_transport(MockTransport::new(json!({"status": "ok"})));
        let metrics = sample_metrics();

        client.post_metrics(&metrics).await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/v1/series");

        let body = requests[0].body.clone().unwrap();
        let sent: Vec<Metric> = serde_json::from_value(body["series"].clone()).unwrap();
        assert_eq!(sent, metrics);
    }

    #[tokio::test]
    async fn test_post_empty_metrics() {
        let client = Client::with_transport(MockTransport::new(json!({})));

        client.post_metrics(&[]).await.unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests[0].body, Some(json!({"series": []})));
    }

    #[tokio::test]
    async fn test_post_metrics_propagates_error() {
        let client = Client::with_transport(MockTransport::failing(403));

        let err = client.post_metrics(&sample_metrics()).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_post_metrics_rejects_nan_without_sending() {
        let client = Client::with_transport(MockTransport::new(json!({})));
        let mut metric = Metric::new("app.latency", "gauge");
        metric.points = vec![DataPoint::new(1.0, f64::NAN)];

        let err = client.post_metrics(&[metric]).await.unwrap_err();

        assert!(matches!(err, ClientError::NonFiniteValue { ref metric, .. } if metric == "app.latency"));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_post_metrics_rejects_infinity() {
        let client = Client::with_transport(MockTransport::new(json!({})));
        let mut metric = Metric::new("app.rate", "gauge");
        metric.points = vec![DataPoint::new(1.0, 2.0), DataPoint::new(2.0, f64::INFINITY)];

        let err = client.post_metrics(&[metric]).await.unwrap_err();

        assert_eq!(err.kind(), crate::errors::ErrorKind::Encoding);
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_metrics_request() {
        let client = Client::with_transport(MockTransport::new(json!({"series": []})));
        let start = Utc.timestamp_opt(1700000000, 0).unwrap();
        let end = Utc.timestamp_opt(1700003600, 999_000_000).unwrap();

        let series = client
            .query_metrics("avg:system.cpu.user{env:prod} by {host}", start, end)
            .await
            .unwrap();

        assert!(series.is_empty());
        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].body, None);
        assert_eq!(
            requests[0].path,
            "/v1/query?start=1700000000&to=1700003600&query=avg%3Asystem.cpu.user%7Benv%3Aprod%7D+by+%7Bhost%7D"
        );
    }

    #[tokio::test]
    async fn test_query_metrics_missing_series_is_empty() {
        let client = Client::with_transport(MockTransport::new(json!({})));
        let now = Utc::now();

        let series = client.query_metrics("avg:cpu", now, now).await.unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_query_metrics_decodes_series() {
        let client = Client::with_transport(MockTransport::new(json!({
            "status": "ok",
            "series": [
                {
                    "expression": "avg:cpu{*}",
                    "metric": "cpu",
                    "aggr": "avg",
                    "scope": "*",
                    "start": 100,
                    "end": 200,
                    "pointlist": [[100.0, 0.5]],
                },
                {
                    "expression": "avg:cpu{host:a}",
                    "metric": "cpu",
                    "aggr": "avg",
                    "scope": "host:a",
                    "start": 100,
                    "end": 200,
                    "pointlist": [],
                },
            ],
        })));
        let start = Utc.timestamp_opt(100, 0).unwrap();
        let end = Utc.timestamp_opt(200, 0).unwrap();

        let series = client.query_metrics("avg:cpu", start, end).await.unwrap();

        assert_eq!(series.len(), 2);
        assert!(series[0].scope.is_empty());
        assert_eq!(series[0].start, start);
        assert_eq!(series[0].end, end);
        assert_eq!(series[0].pointlist, vec![DataPoint::new(100.0, 0.5)]);
        assert_eq!(series[1].scope.get("host").map(String::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_query_metrics_one_bad_record_fails_all() {
        let client = Client::with_transport(MockTransport::new(json!({
            "series": [
                {"scope": "host:a", "start": 0, "end": 1, "pointlist": []},
                {"scope": "host:b,oops", "start": 0, "end": 1, "pointlist": []},
            ],
        })));
        let now = Utc::now();

        let err = client.query_metrics("avg:cpu", now, now).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedScope(ref s) if s == "oops"));
    }

    #[tokio::test]
    async fn test_query_metrics_rejects_non_object() {
        let client = Client::with_transport(MockTransport::new(json!("unexpected")));
        let now = Utc::now();

        let err = client.query_metrics("avg:cpu", now, now).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_query_string_truncates_to_seconds() {
        let start = Utc.timestamp_opt(59, 999_999_999).unwrap();
        let end = Utc.timestamp_opt(120, 1).unwrap();
        assert_eq!(query_string("q", start, end), "start=59&to=120&query=q");
    }
}
