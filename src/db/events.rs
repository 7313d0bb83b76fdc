//! Event Store (§4.4): idempotent bulk persistence and the read-side
//! lookup by integrator.

use super::{Db, DbPool};
use crate::error::{IndexerError, Result};
use crate::events::FeeEvent;
use crate::types::{EvmAddress, TxHash};
use sqlx::QueryBuilder;

pub struct EventStore<'a> {
    db: &'a Db,
}

impl<'a> EventStore<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Insert `events`, ignoring rows whose `(chainId, transactionHash,
    /// logIndex)` identity already exists (§4.4, §7: replay is a no-op).
    ///
    /// A no-op on an empty slice; the Scanner calls this once per window
    /// regardless of whether the window produced any logs. Every event is
    /// revalidated against the §3 schema before anything is written
    /// (§4.4 step 4); a single invalid record aborts the whole batch with
    /// `IndexerError::Validation` and persists nothing from it.
    pub async fn insert_many(&self, events: &[FeeEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        for event in events {
            validate_event(event)?;
        }

        match &self.db.pool {
            DbPool::Sqlite(pool) => {
                let mut qb: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                    "INSERT OR IGNORE INTO fee_collected_events \
                     (chain_id, contract_address, token, integrator, integrator_fee, lifi_fee, \
                      block_number, transaction_hash, log_index) ",
                );

                qb.push_values(events, |mut b, event| {
                    b.push_bind(event.chain_id as i64)
                        .push_bind(&event.contract_address)
                        .push_bind(&event.token)
                        .push_bind(&event.integrator)
                        .push_bind(&event.integrator_fee)
                        .push_bind(&event.lifi_fee)
                        .push_bind(event.block_number as i64)
                        .push_bind(&event.transaction_hash)
                        .push_bind(event.log_index as i64);
                });

                qb.build().execute(pool).await?;
            }
            DbPool::Postgres(pool) => {
                let mut qb: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
                    "INSERT INTO fee_collected_events \
                     (chain_id, contract_address, token, integrator, integrator_fee, lifi_fee, \
                      block_number, transaction_hash, log_index) ",
                );

                qb.push_values(events, |mut b, event| {
                    b.push_bind(event.chain_id as i64)
                        .push_bind(&event.contract_address)
                        .push_bind(&event.token)
                        .push_bind(&event.integrator)
                        .push_bind(&event.integrator_fee)
                        .push_bind(&event.lifi_fee)
                        .push_bind(event.block_number as i64)
                        .push_bind(&event.transaction_hash)
                        .push_bind(event.log_index as i64);
                });

                qb.push(
                    " ON CONFLICT (chain_id, transaction_hash, log_index) DO NOTHING",
                );

                qb.build().execute(pool).await?;
            }
        }

        Ok(())
    }

    /// All events emitted for `integrator` on `chain_id`, newest first
    /// (§4.6 read path).
    pub async fn find_by_integrator(
        &self,
        chain_id: u64,
        integrator: &str,
    ) -> Result<Vec<FeeEvent>> {
        let chain_id_db = chain_id as i64;

        let rows: Vec<(String, String, String, String, String, i64, String, i64)> = match &self.db.pool
        {
            DbPool::Sqlite(pool) => {
                sqlx::query_as(
                    r#"
                    SELECT contract_address, token, integrator, integrator_fee, lifi_fee,
                           block_number, transaction_hash, log_index
                    FROM fee_collected_events
                    WHERE chain_id = ? AND integrator = ?
                    ORDER BY block_number DESC, log_index DESC
                    "#,
                )
                .bind(chain_id_db)
                .bind(integrator)
                .fetch_all(pool)
                .await?
            }
            DbPool::Postgres(pool) => {
                sqlx::query_as(
                    r#"
                    SELECT contract_address, token, integrator, integrator_fee, lifi_fee,
                           block_number, transaction_hash, log_index
                    FROM fee_collected_events
                    WHERE chain_id = $1 AND integrator = $2
                    ORDER BY block_number DESC, log_index DESC
                    "#,
                )
                .bind(chain_id_db)
                .bind(integrator)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(
                |(contract_address, token, integrator, integrator_fee, lifi_fee, block_number, transaction_hash, log_index)| {
                    FeeEvent {
                        chain_id,
                        contract_address,
                        token,
                        integrator,
                        integrator_fee,
                        lifi_fee,
                        block_number: block_number as u64,
                        transaction_hash,
                        log_index: log_index as u64,
                    }
                },
            )
            .collect())
    }
}

/// Revalidate a decoded `FeeEvent` against the §3 schema before persisting
/// it: address/hash shape via the same newtypes the decoder constructs
/// them with, and fee amounts as non-negative decimal digit strings so no
/// float ever round-trips through storage.
fn validate_event(event: &FeeEvent) -> Result<()> {
    EvmAddress::new(event.contract_address.as_str())?;
    EvmAddress::new(event.token.as_str())?;
    EvmAddress::new(event.integrator.as_str())?;
    TxHash::new(event.transaction_hash.as_str())?;
    validate_decimal_integer("integrator_fee", &event.integrator_fee)?;
    validate_decimal_integer("lifi_fee", &event.lifi_fee)?;
    Ok(())
}

fn validate_decimal_integer(field: &str, value: &str) -> Result<()> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(IndexerError::Validation(format!(
            "invalid {field} '{value}': must be a non-negative decimal integer string"
        )))
    }
}
