//! PostgreSQL backend for [`UserStore`].
//!
//! The pool is async (`sqlx`); this store owns a small Tokio runtime and
//! blocks on it, so callers stay synchronous. Do not call it from inside
//! another Tokio runtime.

use super::{StorageError, StorageErrorKind, StorageResult, UserStore};
use crate::extract::CanonicalRecord;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

const CREATE_USERS: &str = r#"CREATE TABLE IF NOT EXISTS public.users (
    id serial4 PRIMARY KEY,
    "name" varchar NOT NULL,
    age int4 NOT NULL,
    address jsonb NULL,
    additional_info jsonb NULL
)"#;

const INSERT_USERS: &str = r#"INSERT INTO public.users ("name", age, address, additional_info) "#;

/// Bind parameters per inserted row.
const BINDS_PER_ROW: usize = 4;

/// Rows per INSERT statement. Postgres caps a statement at 65535 bind
/// parameters; larger batches are split across statements in one transaction.
pub const MAX_ROWS_PER_STATEMENT: usize = u16::MAX as usize / BINDS_PER_ROW;

fn statement_chunks(records: &[CanonicalRecord]) -> std::slice::Chunks<'_, CanonicalRecord> {
    records.chunks(MAX_ROWS_PER_STATEMENT)
}

/// Pool sizing for [`PostgresStore::connect_with`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(2),
        }
    }
}

pub struct PostgresStore {
    runtime: Runtime,
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with the default pool settings.
    ///
    /// # Errors
    /// Returns a connection error if the URL is invalid or the server is unreachable.
    pub fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with(database_url, &PoolSettings::default())
    }

    /// Connect with explicit pool settings.
    ///
    /// # Errors
    /// Returns a connection error if the runtime cannot start, the URL is
    /// invalid, or the server is unreachable.
    pub fn connect_with(database_url: &str, settings: &PoolSettings) -> StorageResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                StorageError::new(StorageErrorKind::Internal, format!("start runtime: {e}"))
            })?;
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .idle_timeout(settings.idle_timeout)
                    .acquire_timeout(settings.acquire_timeout)
                    .connect(database_url),
            )
            .map_err(|e| StorageError::new(StorageErrorKind::Connection, e.to_string()))?;
        Ok(Self { runtime, pool })
    }
}

impl UserStore for PostgresStore {
    fn ensure_schema(&self) -> StorageResult<()> {
        self.runtime
            .block_on(sqlx::query(CREATE_USERS).execute(&self.pool))
            .map_err(|e| StorageError::new(StorageErrorKind::Schema, e.to_string()))?;
        Ok(())
    }

    fn insert_batch(&self, records: &[CanonicalRecord]) -> StorageResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let affected = self
            .runtime
            .block_on(async {
                let mut tx = self.pool.begin().await?;
                let mut affected = 0;
                for chunk in statement_chunks(records) {
                    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_USERS);
                    builder.push_values(chunk, |mut row, rec| {
                        row.push_bind(rec.name.clone())
                            .push_bind(rec.age)
                            .push_bind(rec.address.clone().map(Json))
                            .push_bind(rec.extra.clone().map(Json));
                    });
                    affected += builder.build().execute(&mut *tx).await?.rows_affected();
                }
                tx.commit().await?;
                Ok::<_, sqlx::Error>(affected)
            })
            .map_err(|e| {
                StorageError::new(
                    StorageErrorKind::Insert,
                    format!("insert batch of {}: {e}", records.len()),
                )
            })?;
        debug!(rows = affected, "inserted batch");
        Ok(affected)
    }

    fn read_all_ages(&self) -> StorageResult<Vec<i32>> {
        self.runtime
            .block_on(sqlx::query_scalar::<_, i32>("SELECT age FROM public.users").fetch_all(&self.pool))
            .map_err(|e| StorageError::new(StorageErrorKind::Query, e.to_string()))
    }

    fn close(&self) -> StorageResult<()> {
        self.runtime.block_on(self.pool.close());
        Ok(())
    }
}
