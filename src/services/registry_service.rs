use crate::error::{AppError, Result};
use crate::models::Specification;
use crate::repositories::HandlerRepository;
use crate::services::reachability_checker::HandlerChecker;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a proxied call.
pub const DEFAULT_PROXY_TIMEOUT: Duration = Duration::from_secs(5);

const SOCKET_IN_USE: &str = "socket is already in use";
const ENDPOINT_NOT_FOUND: &str = "endpoint with given params is not found";

/// Registration lifecycle and allow-list gated dispatch.
///
/// Holds no handler state of its own: every operation reads the repository.
/// The socket uniqueness check is point-in-time, so two concurrent
/// registrations of one socket can both succeed.
pub struct RegistryService {
    repository: Arc<dyn HandlerRepository>,
    checker: Arc<dyn HandlerChecker>,
    client: reqwest::Client,
    proxy_timeout: Duration,
}

impl RegistryService {
    pub fn new(
        repository: Arc<dyn HandlerRepository>,
        checker: Arc<dyn HandlerChecker>,
        client: reqwest::Client,
        proxy_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            checker,
            client,
            proxy_timeout,
        }
    }

    pub async fn get_specification(&self, handler_id: &str) -> Result<Specification> {
        Ok(self.repository.get_specification(handler_id).await?)
    }

    pub async fn register(&self, specification: Specification) -> Result<String> {
        self.ensure_socket_free(&specification.socket).await?;

        self.checker.check_handler(&specification).await?;

        let handler_id = self
            .repository
            .create_handler(&specification.socket)
            .await?;

        if let Err(e) = self
            .repository
            .add_methods(&handler_id, &specification.methods)
            .await
        {
            tracing::error!(handler_id = %handler_id, error = %e, "attaching methods failed, removing handler");
            if let Err(cleanup) = self.repository.remove_handler(&handler_id).await {
                tracing::error!(handler_id = %handler_id, error = %cleanup, "compensating delete failed");
            }
            return Err(e.into());
        }

        tracing::info!(handler_id = %handler_id, socket = %specification.socket, "handler registered");
        Ok(handler_id)
    }

    pub async fn unregister(&self, handler_id: &str) -> Result<()> {
        self.repository.remove_handler(handler_id).await?;
        tracing::info!(handler_id = %handler_id, "handler unregistered");
        Ok(())
    }

    pub async fn update(&self, handler_id: &str, specification: Specification) -> Result<()> {
        let current = self.repository.get_specification(handler_id).await?;

        if current.socket != specification.socket {
            self.ensure_socket_free(&specification.socket).await?;
        }

        self.checker.check_handler(&specification).await?;

        self.repository
            .update_handler(handler_id, &specification)
            .await?;

        tracing::info!(handler_id = %handler_id, socket = %specification.socket, "handler updated");
        Ok(())
    }

    /// Forwards a call to the handler if `(path, method)` is declared.
    ///
    /// The upstream response comes back untouched; the caller streams its
    /// body to the client.
    pub async fn use_handler(
        &self,
        handler_id: &str,
        path: &str,
        method: &str,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        let specification = self.repository.get_specification(handler_id).await?;

        if !specification.allows(path, method) {
            tracing::warn!(handler_id = %handler_id, %path, %method, "undeclared endpoint requested");
            return Err(AppError::NotFound(ENDPOINT_NOT_FOUND.to_string()));
        }

        let verb = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| AppError::Network(format!("invalid HTTP method: {}", method)))?;
        let url = specification.target_url(path);

        let mut request = self
            .client
            .request(verb, &url)
            .timeout(self.proxy_timeout);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%url, error = %e, "proxied call failed");
            AppError::Network(e.to_string())
        })?;

        tracing::debug!(%url, status = response.status().as_u16(), "proxied call completed");
        Ok(response)
    }

    async fn ensure_socket_free(&self, socket: &str) -> Result<()> {
        let used = self.repository.list_used_sockets().await?;
        if used.contains(socket) {
            tracing::warn!(%socket, "socket already registered");
            return Err(AppError::Validation(SOCKET_IN_USE.to_string()));
        }
        Ok(())
    }
}
