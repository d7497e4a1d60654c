//! HTTP transport for the configuration service

use crate::error::{MixerError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Method, StatusCode};
use std::time::Duration;
use url::Url;

/// Timeout applied to every request against the configuration service
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Raw answer from the configuration service
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    /// Body if the service sent one
    pub fn body(&self) -> Option<&[u8]> {
        if self.body.is_empty() {
            None
        } else {
            Some(&self.body)
        }
    }
}

/// Performs one request against the configuration service.
///
/// `path` is relative to the backend and already escaped. A non-200 status
/// is not an error here; only transport failures are.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Vec<u8>>)
        -> Result<RawResponse>;
}

/// Requester talking straight to a known base URL
#[derive(Clone, Debug)]
pub struct HttpRequester {
    client: Client,
    base_url: Url,
}

impl HttpRequester {
    /// Create a requester for `base_url`
    ///
    /// A bare `host:port` is accepted and treated as plain HTTP.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mixerctl/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for `path`
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let url = self.url_for(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            tracing::warn!(
                "{} {} returned {} - {}",
                method,
                url,
                status,
                sanitize_for_log(&String::from_utf8_lossy(&body))
            );
        }

        Ok(RawResponse { status, body })
    }
}

/// Parse a backend address, defaulting the scheme to `http`
pub fn parse_base_url(address: &str) -> Result<Url> {
    let address = address.trim();
    if address.is_empty() {
        return Err(MixerError::Resolution(
            "no configuration service address given".to_string(),
        ));
    }

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    Url::parse(&candidate)
        .map_err(|e| MixerError::Resolution(format!("invalid service address {}: {}", address, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_port_defaults_to_http() {
        let url = parse_base_url("istio-galley:9096").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("istio-galley"));
        assert_eq!(url.port(), Some(9096));
    }

    #[test]
    fn empty_address_is_rejected() {
        assert!(matches!(
            parse_base_url("  "),
            Err(MixerError::Resolution(_))
        ));
    }

    #[test]
    fn url_for_joins_with_single_slash_and_keeps_empty_segments() {
        let requester = HttpRequester::new("http://localhost:9096/api/").unwrap();
        assert_eq!(
            requester.url_for("core/adapters/v1//global"),
            "http://localhost:9096/api/core/adapters/v1//global"
        );
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn empty_body_is_absent() {
        let response = RawResponse {
            status: StatusCode::OK,
            body: Bytes::new(),
        };
        assert!(response.body().is_none());
    }
}
