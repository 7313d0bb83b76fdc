//! Progress Store (§4.3): the last block scanned per chain.
//!
//! `get` returns the last block the Scanner successfully finished, not
//! the next block to fetch — resolving §9's open question, the Scanner is
//! the one that adds 1 before starting a new window.

use super::{Db, DbPool};
use crate::error::Result;
use crate::types::ChainId;

pub struct ProgressStore<'a> {
    db: &'a Db,
}

impl<'a> ProgressStore<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Last block number persisted as scanned for `chain_id`, or `None`
    /// if the chain has never recorded progress.
    pub async fn get(&self, chain_id: ChainId) -> Result<Option<u64>> {
        let chain_id = chain_id.as_u64() as i64;

        let row: Option<i64> = match &self.db.pool {
            DbPool::Sqlite(pool) => {
                sqlx::query_scalar("SELECT block_number FROM last_scanned_blocks WHERE chain_id = ?")
                    .bind(chain_id)
                    .fetch_optional(pool)
                    .await?
            }
            DbPool::Postgres(pool) => {
                sqlx::query_scalar(
                    "SELECT block_number FROM last_scanned_blocks WHERE chain_id = $1",
                )
                .bind(chain_id)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(row.map(|v| v as u64))
    }

    /// Record `block_number` as the last block scanned for `chain_id`.
    ///
    /// Monotonic by construction: the Scanner only calls this after a
    /// window's events have been persisted, and windows never run out of
    /// order for a single chain (§4.5 invariants).
    pub async fn set(&self, chain_id: ChainId, block_number: u64) -> Result<()> {
        let chain_id = chain_id.as_u64() as i64;
        let block_number = block_number as i64;

        match &self.db.pool {
            DbPool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO last_scanned_blocks (chain_id, block_number, updated_at)
                    VALUES (?, ?, datetime('now'))
                    ON CONFLICT (chain_id) DO UPDATE SET
                        block_number = excluded.block_number,
                        updated_at = datetime('now')
                    "#,
                )
                .bind(chain_id)
                .bind(block_number)
                .execute(pool)
                .await?;
            }
            DbPool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO last_scanned_blocks (chain_id, block_number, updated_at)
                    VALUES ($1, $2, now())
                    ON CONFLICT (chain_id) DO UPDATE SET
                        block_number = excluded.block_number,
                        updated_at = now()
                    "#,
                )
                .bind(chain_id)
                .bind(block_number)
                .execute(pool)
                .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Db {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        Db::from_sqlite_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn returns_none_for_unscanned_chain() {
        let db = memory_db().await;
        let store = ProgressStore::new(&db);
        assert_eq!(store.get(ChainId::POLYGON).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let db = memory_db().await;
        let store = ProgressStore::new(&db);
        store.set(ChainId::POLYGON, 1000).await.unwrap();
        assert_eq!(store.get(ChainId::POLYGON).await.unwrap(), Some(1000));
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let db = memory_db().await;
        let store = ProgressStore::new(&db);
        store.set(ChainId::POLYGON, 1000).await.unwrap();
        store.set(ChainId::POLYGON, 2000).await.unwrap();
        assert_eq!(store.get(ChainId::POLYGON).await.unwrap(), Some(2000));
    }

    #[tokio::test]
    async fn tracks_chains_independently() {
        let db = memory_db().await;
        let store = ProgressStore::new(&db);
        store.set(ChainId::POLYGON, 1000).await.unwrap();
        store.set(ChainId::ETHEREUM, 500).await.unwrap();
        assert_eq!(store.get(ChainId::POLYGON).await.unwrap(), Some(1000));
        assert_eq!(store.get(ChainId::ETHEREUM).await.unwrap(), Some(500));
    }
}
