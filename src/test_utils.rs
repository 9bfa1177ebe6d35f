pub mod test_helpers {
    use crate::models::{Method, Specification};
    use sqlx::{
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
        SqlitePool,
    };
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            // A dropped connection would take the in-memory database with it
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when several connections must see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = crate::db::create_pool(&database_url).await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Insert a handler row and its methods directly, bypassing the service
    pub async fn insert_test_handler(
        pool: &SqlitePool,
        specification: &Specification,
    ) -> Result<String, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO handlers (id, socket_address) VALUES (?, ?)")
            .bind(&id)
            .bind(&specification.socket)
            .execute(pool)
            .await?;

        for method in &specification.methods {
            sqlx::query(
                "INSERT INTO methods (handler_id, path_part, method_type) VALUES (?, ?, ?)",
            )
            .bind(&id)
            .bind(&method.path_part)
            .bind(&method.method_type)
            .execute(pool)
            .await?;
        }

        Ok(id)
    }

    /// Single-method specification, the common case in tests
    pub fn single_method_spec(socket: &str, path: &str, method: &str) -> Specification {
        Specification::new(socket, vec![Method::new(path, method)])
    }
}
