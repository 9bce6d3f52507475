//! Database service for backoffice-service.
//!
//! Queries are grouped by area in submodules, each adding an `impl Database`
//! block.

mod access;
mod catalog;
mod finance;
mod people;
mod sales;
mod scheduling;

use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::{ActivityLog, PermissionSource};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "backoffice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (connections may be opened lazily).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub(crate) async fn begin(&self) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, AppError> {
        self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })
    }
}

/// Map a query failure to the API error it represents.
pub(crate) fn query_error(operation: &str, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Conflict(
            anyhow::anyhow!("Cannot {}: a record with the same value already exists", operation),
        ),
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound(anyhow::anyhow!(
                "Cannot {}: a referenced record does not exist",
                operation
            ))
        }
        sqlx::Error::Database(ref db_err) if db_err.is_check_violation() => AppError::BadRequest(
            anyhow::anyhow!("Cannot {}: a value is out of range", operation),
        ),
        _ => AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", operation, e)),
    }
}

pub(crate) async fn commit(tx: sqlx::Transaction<'static, sqlx::Postgres>) -> Result<(), AppError> {
    tx.commit().await.map_err(|e| {
        AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
    })
}

/// `LIKE` pattern matching values that start with `term`.
pub(crate) fn prefix_pattern(term: &str) -> String {
    format!("{}%", escape_like(term))
}

/// `ILIKE` pattern matching values that contain `term`.
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Treat an empty search result as not found.
pub(crate) fn non_empty<T>(rows: Vec<T>, what: &str) -> Result<Vec<T>, AppError> {
    if rows.is_empty() {
        Err(AppError::NotFound(anyhow::anyhow!("No {} found", what)))
    } else {
        Ok(rows)
    }
}

#[async_trait]
impl PermissionSource for Database {
    #[instrument(skip(self))]
    async fn has_permission(&self, email: &str, code: i32) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["has_permission"])
            .start_timer();

        let granted = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM users u
                JOIN user_type_roles utr ON utr.user_type_id = u.user_type_id
                JOIN role_permissions rp ON rp.role_id = utr.role_id
                WHERE lower(u.email) = lower($1)
                  AND u.user_state_type_id = 1
                  AND rp.permission_id = $2
            )
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| query_error("check permission", e))?;

        timer.observe_duration();

        Ok(granted)
    }
}

#[async_trait]
impl ActivityLog for Database {
    async fn record(&self, email: &str, action: &str) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_log"])
            .start_timer();

        sqlx::query("INSERT INTO logs (email, action, date_time) VALUES ($1, $2, LOCALTIMESTAMP)")
            .bind(email)
            .bind(action)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("record log", e))?;

        timer.observe_duration();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_patterns_escape_wildcards() {
        assert_eq!(prefix_pattern("12"), "12%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_non_empty() {
        assert!(non_empty(vec![1], "items").is_ok());
        let err = non_empty(Vec::<i32>::new(), "items").unwrap_err();
        assert_eq!(err.to_string(), "Not found: No items found");
    }
}
