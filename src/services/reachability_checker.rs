//! Registration-time reachability probe.
//!
//! Before a specification is stored, each declared method is called once on
//! the remote socket with an empty body. A `404 Not Found` means the endpoint
//! does not exist and rejects the specification; any other status passes.
//! Response bodies and other status codes are not inspected.

use crate::models::{Method, Specification};
use async_trait::async_trait;
use std::time::Duration;

/// Default bound on a whole check, across all declared methods.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The remote answered 404 for a declared method
    #[error("given method is not found: {0}")]
    MethodNotFound(Method),

    /// Invalid verb, DNS failure, refused connection or timeout
    #[error("{0}")]
    Network(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HandlerChecker: Send + Sync {
    async fn check_handler(&self, specification: &Specification) -> Result<(), CheckError>;
}

/// Probes handlers over HTTP with a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpReachabilityChecker {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for HttpReachabilityChecker {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_PROBE_TIMEOUT)
    }
}

impl HttpReachabilityChecker {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn probe(&self, socket: &str, method: &Method) -> Result<(), CheckError> {
        let verb = reqwest::Method::from_bytes(method.method_type.as_bytes()).map_err(|_| {
            CheckError::Network(format!("invalid HTTP method: {}", method.method_type))
        })?;
        let url = format!("{}{}", socket, method.path_part);

        tracing::debug!(%url, method = %verb, "probing handler endpoint");

        let response = self
            .client
            .request(verb, &url)
            .send()
            .await
            .map_err(|e| CheckError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CheckError::MethodNotFound(method.clone()));
        }

        Ok(())
    }
}

#[async_trait]
impl HandlerChecker for HttpReachabilityChecker {
    async fn check_handler(&self, specification: &Specification) -> Result<(), CheckError> {
        let probes = async {
            for method in &specification.methods {
                self.probe(&specification.socket, method).await?;
            }
            Ok::<(), CheckError>(())
        };

        let result = match tokio::time::timeout(self.timeout, probes).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::Network(format!(
                "reachability check timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };

        if let Err(e) = &result {
            tracing::warn!(socket = %specification.socket, error = %e, "handler check failed");
        }

        result
    }
}
