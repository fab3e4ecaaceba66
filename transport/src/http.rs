//! reqwest-backed transport.

use std::time::Duration;

use futures_util::StreamExt;
use intake_types::Payload;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::retry::{self, RetryConfig, RetryOutcome};
use crate::{DEFAULT_BASE_URL, ServerReply, Transport, TransportError};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Replies larger than this are cut off and will fail to parse.
pub const MAX_REPLY_BODY_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    /// Whole-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// Posts payloads as JSON to `{base_url}{endpoint}`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retry: RetryConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let base_url = parse_base_url(&config.base_url)?;
        let client = client_builder(&config)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout.as_millis())
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, payload: &Payload) -> Result<ServerReply, TransportError> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!(url = %url, fields = payload.len(), "Posting form payload");

        let outcome =
            retry::send_with_retry(|| self.client.post(url.clone()).json(payload), &self.retry)
                .await;

        let response = match outcome {
            RetryOutcome::Response(response) => response,
            RetryOutcome::ConnectionError { attempts, source } => {
                tracing::debug!(attempts, error = %source, "Connection failed");
                return Err(self.map_error(&source));
            }
            RetryOutcome::Failed(source) => return Err(self.map_error(&source)),
        };

        let status = response.status().as_u16();
        let body = read_capped_body(response)
            .await
            .map_err(|e| self.map_error(&e))?;
        tracing::debug!(url = %url, status, bytes = body.len(), "Received reply");
        Ok(ServerReply::from_bytes(status, &body))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| TransportError::InvalidEndpoint(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::InvalidEndpoint(format!(
            "{raw}: scheme must be http or https"
        )));
    }
    // Joining relative endpoints keeps the base path only if it ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn client_builder(config: &HttpTransportConfig) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    default_headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("intake/", env!("CARGO_PKG_VERSION"))),
    );

    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .default_headers(default_headers)
}

async fn read_capped_body(response: reqwest::Response) -> Result<Vec<u8>, reqwest::Error> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
        if body.len() > MAX_REPLY_BODY_BYTES {
            body.truncate(MAX_REPLY_BODY_BYTES);
            break;
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn joins_endpoints_onto_base() {
        let t = transport("http://127.0.0.1:5000");
        assert_eq!(
            t.endpoint_url("/submit_contact").unwrap().as_str(),
            "http://127.0.0.1:5000/submit_contact"
        );

        let nested = transport("https://example.com/api");
        assert_eq!(
            nested.endpoint_url("/submit_quote").unwrap().as_str(),
            "https://example.com/api/submit_quote"
        );
    }

    #[test]
    fn rejects_bad_base_urls() {
        for base in ["not a url", "ftp://example.com", ""] {
            let err = HttpTransport::new(HttpTransportConfig {
                base_url: base.to_string(),
                ..Default::default()
            })
            .unwrap_err();
            assert!(matches!(err, TransportError::InvalidEndpoint(_)), "{base}");
        }
    }
}
