//! Storage layer (§4.3 Progress Store, §4.4 Event Store).
//!
//! Backend is selected at runtime from the connection URL, the same way
//! the cache layer this is descended from picks SQLite vs PostgreSQL: a
//! `postgres://`/`postgresql://` URL gets a `PgPool`, everything else is
//! treated as a SQLite path. Each backend carries its own embedded
//! migration set since the SQL (autoincrement vs bigserial, `ON CONFLICT`
//! vs `INSERT OR IGNORE`) is not portable between them.

pub mod events;
pub mod progress;

use crate::error::Result;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone)]
pub enum DbPool {
    Sqlite(sqlx::SqlitePool),
    Postgres(sqlx::PgPool),
}

#[derive(Clone)]
pub struct Db {
    pool: DbPool,
}

impl Db {
    /// Connect to `url`, creating a SQLite file if missing, and run the
    /// embedded migrations for the detected backend.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            tracing::info!("connecting to PostgreSQL database");
            DbPool::Postgres(sqlx::PgPool::connect(url).await?)
        } else {
            tracing::info!("connecting to SQLite database at {url}");
            let db_url = if url.starts_with("sqlite://") {
                url.to_string()
            } else {
                if let Some(parent) = Path::new(url).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
                    }
                }
                format!("sqlite:{url}")
            };

            use sqlx::sqlite::SqliteConnectOptions;
            let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
            DbPool::Sqlite(sqlx::SqlitePool::connect_with(options).await?)
        };

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Wrap an already-open SQLite pool, e.g. `sqlite::memory:` in tests.
    pub async fn from_sqlite_pool(pool: sqlx::SqlitePool) -> Result<Self> {
        let db = Self {
            pool: DbPool::Sqlite(pool),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        match &self.pool {
            DbPool::Sqlite(pool) => {
                sqlx::migrate!("./migrations")
                    .run(pool)
                    .await
                    .map_err(|e| crate::error::IndexerError::Database(sqlx::Error::Migrate(Box::new(e))))?;
            }
            DbPool::Postgres(pool) => {
                sqlx::migrate!("./migrations_postgres")
                    .run(pool)
                    .await
                    .map_err(|e| crate::error::IndexerError::Database(sqlx::Error::Migrate(Box::new(e))))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_creates_sqlite_file_and_runs_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexer.db");

        let db = Db::connect(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        // A second connect against the same file re-runs already-applied
        // migrations as a no-op rather than erroring.
        drop(db);
        Db::connect(path.to_str().unwrap()).await.unwrap();
    }
}
