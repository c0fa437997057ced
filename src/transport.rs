use crate::config::ClientConfig;
use crate::errors::ClientError;
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Performs one JSON exchange with the API. `path` is relative to the API
/// root and already carries its query string.
#[async_trait::async_trait]
pub trait JsonTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(HttpTransport { client, config })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.config.api_base().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/api{}", base, path))?;
        url.query_pairs_mut()
            .append_pair("api_key", self.config.api_key())
            .append_pair("application_key", self.config.app_key());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl JsonTransport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url_for(path)?;
        log::debug!("{} {}", method, path);

        let mut builder = self.client.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("{} {} returned {}", method, path, status);
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // NOTE: some endpoints answer 202 with no body at all
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&text).map_err(ClientError::Decode)
    }
}
