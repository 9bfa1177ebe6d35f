use crate::models::{Handler, Method, Specification};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

/// Default bound on a single store operation.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Handler {0} not found")]
    NotFound(String),
    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Durable mapping from handler id to its specification.
///
/// Every call goes to storage; implementations keep no cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HandlerRepository: Send + Sync {
    async fn list_used_sockets(&self) -> RepositoryResult<HashSet<String>>;
    async fn get_specification(&self, handler_id: &str) -> RepositoryResult<Specification>;
    async fn create_handler(&self, socket: &str) -> RepositoryResult<String>;
    async fn add_methods(&self, handler_id: &str, methods: &[Method]) -> RepositoryResult<()>;
    async fn remove_handler(&self, handler_id: &str) -> RepositoryResult<()>;
    /// Replaces socket and method list in one transaction.
    async fn update_handler(
        &self,
        handler_id: &str,
        specification: &Specification,
    ) -> RepositoryResult<()>;
    async fn list_handlers(&self) -> RepositoryResult<Vec<Handler>>;
}

pub struct SqliteHandlerRepository {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteHandlerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_timeout(pool, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, fut: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                tracing::warn!(timeout_ms, "store operation timed out");
                Err(RepositoryError::Timeout(timeout_ms))
            }
        }
    }

    async fn fetch_specification(&self, handler_id: &str) -> RepositoryResult<Specification> {
        // One read transaction so a concurrent update is seen whole or not at all
        let mut tx = self.pool.begin().await?;

        let socket: Option<String> =
            sqlx::query_scalar("SELECT socket_address FROM handlers WHERE id = ?")
                .bind(handler_id)
                .fetch_optional(&mut *tx)
                .await?;

        let socket = socket.ok_or_else(|| RepositoryError::NotFound(handler_id.to_string()))?;

        let methods = sqlx::query(
            "SELECT path_part, method_type FROM methods WHERE handler_id = ? ORDER BY id",
        )
        .bind(handler_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|r| Method {
            path_part: r.get("path_part"),
            method_type: r.get("method_type"),
        })
        .collect();

        tx.commit().await?;
        Ok(Specification { socket, methods })
    }

    async fn insert_methods(&self, handler_id: &str, methods: &[Method]) -> RepositoryResult<()> {
        if methods.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for method in methods {
            sqlx::query("INSERT INTO methods (handler_id, path_part, method_type) VALUES (?, ?, ?)")
                .bind(handler_id)
                .bind(&method.path_part)
                .bind(&method.method_type)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_handler(&self, handler_id: &str) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM methods WHERE handler_id = ?")
            .bind(handler_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM handlers WHERE id = ?")
            .bind(handler_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_handler(
        &self,
        handler_id: &str,
        specification: &Specification,
    ) -> RepositoryResult<()> {
        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE handlers SET socket_address = ? WHERE id = ?")
            .bind(&specification.socket)
            .bind(handler_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(handler_id.to_string()));
        }

        sqlx::query("DELETE FROM methods WHERE handler_id = ?")
            .bind(handler_id)
            .execute(&mut *tx)
            .await?;

        for method in &specification.methods {
            sqlx::query("INSERT INTO methods (handler_id, path_part, method_type) VALUES (?, ?, ?)")
                .bind(handler_id)
                .bind(&method.path_part)
                .bind(&method.method_type)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_all_handlers(&self) -> RepositoryResult<Vec<Handler>> {
        let mut tx = self.pool.begin().await?;

        let handler_rows = sqlx::query(
            "SELECT id, socket_address, created_at FROM handlers ORDER BY created_at, id",
        )
        .fetch_all(&mut *tx)
        .await?;

        let method_rows =
            sqlx::query("SELECT handler_id, path_part, method_type FROM methods ORDER BY id")
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        let mut methods_by_handler: HashMap<String, Vec<Method>> = HashMap::new();
        for r in method_rows {
            methods_by_handler
                .entry(r.get("handler_id"))
                .or_default()
                .push(Method {
                    path_part: r.get("path_part"),
                    method_type: r.get("method_type"),
                });
        }

        Ok(handler_rows
            .into_iter()
            .map(|r| {
                let id: String = r.get("id");
                let methods = methods_by_handler.remove(&id).unwrap_or_default();
                Handler {
                    specification: Specification {
                        socket: r.get("socket_address"),
                        methods,
                    },
                    created_at: chrono::DateTime::from_timestamp(r.get::<i64, _>("created_at"), 0)
                        .map(|dt| dt.naive_utc())
                        .unwrap_or_default(),
                    id,
                }
            })
            .collect())
    }
}

#[async_trait]
impl HandlerRepository for SqliteHandlerRepository {
    async fn list_used_sockets(&self) -> RepositoryResult<HashSet<String>> {
        self.bounded(async {
            let sockets: Vec<String> = sqlx::query_scalar("SELECT socket_address FROM handlers")
                .fetch_all(&self.pool)
                .await?;
            Ok::<_, RepositoryError>(sockets.into_iter().collect())
        })
        .await
    }

    async fn get_specification(&self, handler_id: &str) -> RepositoryResult<Specification> {
        self.bounded(self.fetch_specification(handler_id)).await
    }

    async fn create_handler(&self, socket: &str) -> RepositoryResult<String> {
        self.bounded(async {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query("INSERT INTO handlers (id, socket_address) VALUES (?, ?)")
                .bind(&id)
                .bind(socket)
                .execute(&self.pool)
                .await?;
            Ok::<_, RepositoryError>(id)
        })
        .await
    }

    async fn add_methods(&self, handler_id: &str, methods: &[Method]) -> RepositoryResult<()> {
        self.bounded(self.insert_methods(handler_id, methods)).await
    }

    async fn remove_handler(&self, handler_id: &str) -> RepositoryResult<()> {
        self.bounded(self.delete_handler(handler_id)).await
    }

    async fn update_handler(
        &self,
        handler_id: &str,
        specification: &Specification,
    ) -> RepositoryResult<()> {
        self.bounded(self.replace_handler(handler_id, specification))
            .await
    }

    async fn list_handlers(&self) -> RepositoryResult<Vec<Handler>> {
        self.bounded(self.fetch_all_handlers()).await
    }
}
