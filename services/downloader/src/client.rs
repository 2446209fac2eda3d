//! Client for the remote image-computation service.
//!
//! The service exposes three endpoints:
//! - `POST {base}/v1/image:computePixels` evaluates an expression
//! - `POST {base}/v1/image:getPixels` reads an asset
//! - `GET  {base}/v1/assets/{assetId}/properties` returns image metadata
//!
//! Requests above the per-request pixel quota are rejected with HTTP 400.
//! The rejection is turned into a typed [`ServiceError::QuotaExceeded`] here
//! so nothing downstream ever looks at error text.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use raster_common::{RasterRequest, RasterSource};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tiling::QuotaViolation;
use tracing::{debug, instrument, warn};

use crate::config::ServiceConfig;

/// Errors returned by an [`ImageService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request exceeded the pixel quota and may be split.
    #[error("pixel quota exceeded: {0}")]
    QuotaExceeded(QuotaViolation),

    /// A rejection whose quota numbers could not be read.
    #[error("malformed quota signal: {0}")]
    MalformedQuotaSignal(String),

    /// Any other non-success response.
    #[error("service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, timeout or body transfer failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl ServiceError {
    /// Whether the request can be retried after splitting.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}

/// Remote image-computation service.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Fetch encoded raster bytes for `request`.
    async fn fetch(&self, request: &RasterRequest) -> Result<Bytes, ServiceError>;

    /// Fetch the properties document of an asset.
    async fn properties(&self, asset_id: &str) -> Result<Map<String, Value>, ServiceError>;
}

/// Error document returned by the service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    requested_pixels: Option<u64>,
    #[serde(default)]
    allowed_pixels: Option<u64>,
}

/// Classify a non-success response.
///
/// A 400 carrying explicit `requestedPixels`/`allowedPixels` is used as-is.
/// Otherwise the first two integers of `error.message` are the requested and
/// allowed pixel counts. A 400 that yields neither is a malformed signal.
pub fn classify_error(status: StatusCode, body: &str) -> ServiceError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);

    if status != StatusCode::BAD_REQUEST {
        let message = detail
            .map(|d| d.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.to_string());
        return ServiceError::Http {
            status: status.as_u16(),
            message,
        };
    }

    let Some(detail) = detail else {
        return ServiceError::MalformedQuotaSignal(body.to_string());
    };

    let violation = match (detail.requested_pixels, detail.allowed_pixels) {
        (Some(requested), Some(allowed)) => QuotaViolation::new(requested, allowed),
        _ => QuotaViolation::parse_message(&detail.message),
    };

    match violation {
        Ok(v) => ServiceError::QuotaExceeded(v),
        Err(e) => ServiceError::MalformedQuotaSignal(e.to_string()),
    }
}

/// HTTP client with the configured timeouts and pool size.
pub fn http_client(config: &ServiceConfig) -> Result<Client, ServiceError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_connections)
        .tcp_nodelay(true)
        .build()?)
}

/// HTTP implementation of [`ImageService`].
pub struct HttpImageService {
    client: Client,
    base_url: String,
}

impl HttpImageService {
    /// Create a client for the configured service.
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying HTTP client, shared with other downloads of the run.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn pixels_url(&self, source: &RasterSource) -> String {
        let method = match source {
            RasterSource::Expression(_) => "computePixels",
            RasterSource::Asset(_) => "getPixels",
        };
        format!("{}/v1/image:{}", self.base_url, method)
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    #[instrument(skip(self, request), fields(source = %request.source.label(), width = request.width(), height = request.height()))]
    async fn fetch(&self, request: &RasterRequest) -> Result<Bytes, ServiceError> {
        let url = self.pixels_url(&request.source);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!(bytes = bytes.len(), "Received raster");
            return Ok(bytes);
        }

        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        if !error.is_quota() {
            warn!(status = %status, error = %error, "Pixel request rejected");
        }
        Err(error)
    }

    #[instrument(skip(self))]
    async fn properties(&self, asset_id: &str) -> Result<Map<String, Value>, ServiceError> {
        let url = format!("{}/v1/assets/{}/properties", self.base_url, asset_id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        match response.json::<Value>().await? {
            Value::Object(map) => Ok(map),
            other => Err(ServiceError::Decode(format!(
                "expected properties object for {}, got {}",
                asset_id, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::quota;

    fn error_json(message: &str) -> String {
        serde_json::json!({ "error": { "code": 400, "message": message } }).to_string()
    }

    #[test]
    fn test_quota_message_is_typed() {
        let err = classify_error(StatusCode::BAD_REQUEST, &error_json(quota::MESSAGE));
        match err {
            ServiceError::QuotaExceeded(v) => {
                assert_eq!(v.requested, 4_260_096);
                assert_eq!(v.allowed, 1_048_576);
            }
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_pixel_fields_win() {
        let body = serde_json::json!({
            "error": {
                "message": "too big: 1 2",
                "requestedPixels": 5000,
                "allowedPixels": 1000
            }
        })
        .to_string();

        let err = classify_error(StatusCode::BAD_REQUEST, &body);
        assert!(matches!(
            err,
            ServiceError::QuotaExceeded(QuotaViolation { requested: 5000, allowed: 1000 })
        ));
    }

    #[test]
    fn test_unparsable_rejection_is_malformed() {
        for body in [
            error_json(quota::NO_NUMBERS),
            error_json(quota::ONE_NUMBER),
            "not json".to_string(),
        ] {
            let err = classify_error(StatusCode::BAD_REQUEST, &body);
            assert!(
                matches!(err, ServiceError::MalformedQuotaSignal(_)),
                "{:?}",
                err
            );
        }
    }

    #[test]
    fn test_other_status_is_http_error() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, &error_json("backend down"));
        match err {
            ServiceError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "backend down");
            }
            other => panic!("expected Http, got {:?}", other),
        }
    }
}
