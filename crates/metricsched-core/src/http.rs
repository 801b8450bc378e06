//! JSON-over-HTTP/1 client.
//!
//! Thin wrapper over the hyper-util pooled client. Every call is a single
//! attempt bounded by the configured timeout; status codes are returned to
//! the caller uninterpreted.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::HttpError;

const USER_AGENT: &str = concat!("metricsched/", env!("CARGO_PKG_VERSION"));

/// A fully-read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let inner = Client::builder(TokioExecutor::new()).build_http();
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn get(&self, uri: &str) -> Result<HttpResponse, HttpError> {
        self.send(Method::GET, uri, Bytes::new(), None).await
    }

    /// POST `body` serialized as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        uri: &str,
        body: &T,
    ) -> Result<HttpResponse, HttpError> {
        let payload = serde_json::to_vec(body)?;
        self.send(Method::POST, uri, Bytes::from(payload), Some("application/json"))
            .await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<HttpResponse, HttpError> {
        let parsed: Uri = uri.parse().map_err(|source| HttpError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(parsed)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let req = builder.body(Full::new(body))?;

        let exchange = async {
            let resp = self
                .inner
                .request(req)
                .await
                .map_err(|source| HttpError::Request {
                    uri: uri.to_string(),
                    source,
                })?;
            let status = resp.status();
            let body = resp
                .into_body()
                .collect()
                .await
                .map_err(|source| HttpError::Body {
                    uri: uri.to_string(),
                    source,
                })?
                .to_bytes();
            Ok::<_, HttpError>(HttpResponse { status, body })
        };

        let result = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| HttpError::Timeout {
                uri: uri.to_string(),
                timeout: self.timeout,
            })?;

        if let Ok(resp) = &result {
            debug!(%method, %uri, status = %resp.status, bytes = resp.body.len(), "http exchange");
        }
        result
    }
}
