use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row as _, Transaction};
use tracing::{debug, error, info};

use super::store::{Row, Store, StoreError};
use super::table::Table;
use crate::auth::AuthUser;
use crate::config::DatabaseConfig;
use crate::filter::{insert_sql, Filter, Param, SqlResult, Values};

/// Postgres adapter. Each call runs in its own transaction with the caller's
/// claims installed and the row-level security role assumed, so the policies
/// in `migrations/` decide which rows are visible.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    rls_role: Option<String>,
    log_queries: bool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database: {}", redact_url(url));
        Ok(Self {
            pool,
            rls_role: config.rls_role.clone(),
            log_queries: config.enable_query_logging,
        })
    }

    pub fn from_pool(pool: PgPool, rls_role: Option<String>) -> Self {
        Self {
            pool,
            rls_role,
            log_queries: false,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("Migration failed: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    async fn begin(&self, caller: &AuthUser) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT set_config('request.jwt.claims', $1, true), set_config('request.jwt.claim.sub', $2, true)")
            .bind(caller.claims_json().to_string())
            .bind(caller.id.to_string())
            .execute(&mut *tx)
            .await?;

        if let Some(role) = &self.rls_role {
            sqlx::query(&format!("SET LOCAL ROLE {}", quote_identifier(role)))
                .execute(&mut *tx)
                .await?;
        }

        Ok(tx)
    }

    fn log(&self, sql: &SqlResult) {
        if self.log_queries {
            debug!(params = sql.params.len(), "{}", sql.query);
        }
    }

    async fn fetch_rows(&self, caller: &AuthUser, table: Table, sql: SqlResult) -> Result<Vec<Row>, StoreError> {
        self.log(&sql);
        let mut tx = self.begin(caller).await?;
        let rows = build(&sql.query, &sql.params)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| classify(table, e))?;
        tx.commit().await?;

        rows.iter().map(decode_row).collect()
    }
}

/// Bind typed parameters in placeholder order
fn build<'q>(sql: &'q str, params: &[Param]) -> Query<'q, Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param.clone() {
            Param::Uuid(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
            Param::Bool(v) => query.bind(v),
            Param::Int(v) => query.bind(v),
            Param::Timestamp(v) => query.bind(v),
            Param::Json(v) => query.bind(sqlx::types::Json(v)),
        };
    }
    query
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Row, StoreError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!("Expected JSON object row, got {}", other))),
    }
}

/// Map policy and foreign-key violations onto their store errors
fn classify(table: Table, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("42501") => return StoreError::PolicyViolation(table),
            Some("23503") => return StoreError::ForeignKey(db.message().to_string()),
            _ => {}
        }
    }
    error!(table = %table, "database error: {}", err);
    StoreError::Sqlx(err)
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Database URL with the password masked, for logs
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("****")).is_err() {
                return "<invalid database url>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<invalid database url>".to_string(),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, caller: &AuthUser, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let sql = filter.to_sql()?;
        self.fetch_rows(caller, filter.table(), sql).await
    }

    async fn count(&self, caller: &AuthUser, filter: &Filter) -> Result<i64, StoreError> {
        let sql = filter.to_count_sql()?;
        self.log(&sql);
        let mut tx = self.begin(caller).await?;
        let row = build(&sql.query, &sql.params)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| classify(filter.table(), e))?;
        tx.commit().await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn insert(&self, caller: &AuthUser, table: Table, values: &Values) -> Result<Row, StoreError> {
        let sql = insert_sql(table, values)?;
        let mut rows = self.fetch_rows(caller, table, sql).await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows);
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, caller: &AuthUser, filter: &Filter, values: &Values) -> Result<Vec<Row>, StoreError> {
        if values.is_empty() {
            return self.select(caller, filter).await;
        }
        let sql = filter.to_update_sql(values)?;
        self.fetch_rows(caller, filter.table(), sql).await
    }

    async fn delete(&self, caller: &AuthUser, filter: &Filter) -> Result<u64, StoreError> {
        let sql = filter.to_delete_sql()?;
        self.log(&sql);
        let mut tx = self.begin(caller).await?;
        let result = build(&sql.query, &sql.params)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify(filter.table(), e))?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
