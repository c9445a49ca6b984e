use bytes::Bytes;
use std::time::{Duration, Instant};
use storage_bench_common::{BenchError, ErrorResponse, Result, Target};
use uuid::Uuid;

/// Object client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: Target,
}

/// Timing and size of one completed object transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub status: u16,
    /// Body bytes sent (PUT) or received (GET).
    pub bytes: u64,
    /// Time from issuing the request until the response headers arrived.
    pub headers_after: Duration,
    /// Time from issuing the request until the response body was fully consumed.
    pub total: Duration,
}

/// Path-style HTTP object client: `/{bucket}` and `/{bucket}/{object}`.
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn build_bucket_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.target.base_url.trim_end_matches('/'),
            self.config.target.bucket
        )
    }

    pub fn build_object_url(&self, object: &str) -> String {
        format!("{}/{}", self.build_bucket_url(), object)
    }

    /// Returns `BucketNotFound` if the bucket does not exist.
    pub async fn head_bucket(&self) -> Result<()> {
        let response = self
            .http_client
            .head(self.build_bucket_url())
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BenchError::BucketNotFound(self.config.target.bucket.clone()));
        }
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }
        Ok(())
    }

    pub async fn create_bucket(&self) -> Result<()> {
        let response = self
            .http_client
            .put(self.build_bucket_url())
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }
        Ok(())
    }

    /// Make sure the configured bucket exists, creating it if the endpoint
    /// reports it missing. Returns `true` when the bucket was created.
    pub async fn ensure_bucket(&self) -> Result<bool> {
        match self.head_bucket().await {
            Ok(()) => Ok(false),
            Err(BenchError::BucketNotFound(_)) => {
                self.create_bucket().await?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Upload `body` as `object`.
    pub async fn put_object(&self, object: &str, body: Bytes) -> Result<Transfer> {
        let len = body.len() as u64;
        let started = Instant::now();

        let response = self
            .http_client
            .put(self.build_object_url(object))
            .header("Content-Type", "application/octet-stream")
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .body(body)
            .send()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;
        let headers_after = started.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        response
            .bytes()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;

        Ok(Transfer {
            status: status.as_u16(),
            bytes: len,
            headers_after,
            total: started.elapsed(),
        })
    }

    /// Download `object`, consuming the whole body.
    pub async fn get_object(&self, object: &str) -> Result<Transfer> {
        let started = Instant::now();

        let response = self
            .http_client
            .get(self.build_object_url(object))
            .header("X-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;
        let headers_after = started.elapsed();

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BenchError::ObjectNotFound(object.to_string()));
        }
        if !status.is_success() {
            return Err(parse_error_response(status, response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BenchError::Network(e.to_string()))?;

        Ok(Transfer {
            status: status.as_u16(),
            bytes: body.len() as u64,
            headers_after,
            total: started.elapsed(),
        })
    }
}

async fn parse_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> BenchError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    BenchError::Http(status.as_u16(), error_msg)
}
