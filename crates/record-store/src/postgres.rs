use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    RecordId, RecordStore, RecordStoreError, Result, TransactionKey, TransactionRecord,
    TransactionStatus, TransactionType,
};

/// Name of the unique constraint backing the idempotency key.
const UNIQUE_KEY_CONSTRAINT: &str = "unique_reference_transaction_type";

const SELECT_COLUMNS: &str = "id, reference_number, transaction_type, sender_name, receiver_name, \
     amount, currency, channel_id, status, status_code, status_desc, created_at, updated_at";

/// PostgreSQL-backed record store implementation.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<TransactionRecord> {
        let transaction_type: String = row.try_get("transaction_type")?;
        let status: String = row.try_get("status")?;

        Ok(TransactionRecord {
            id: RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            reference_number: row.try_get("reference_number")?,
            transaction_type: transaction_type
                .parse::<TransactionType>()
                .map_err(|e| RecordStoreError::Corrupt(e.to_string()))?,
            sender_name: row.try_get("sender_name")?,
            receiver_name: row.try_get("receiver_name")?,
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            channel_id: row.try_get("channel_id")?,
            status: status
                .parse::<TransactionStatus>()
                .map_err(|e| RecordStoreError::Corrupt(e.to_string()))?,
            status_code: row.try_get("status_code")?,
            status_desc: row.try_get("status_desc")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn exists(&self, key: &TransactionKey) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transaction_records
                WHERE reference_number = $1 AND transaction_type = $2
            )
            "#,
        )
        .bind(&key.reference_number)
        .bind(key.transaction_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, record: TransactionRecord) -> Result<()> {
        let key = record.key();

        // Autocommit: the row is durable once the statement returns.
        sqlx::query(
            r#"
            INSERT INTO transaction_records (
                id, reference_number, transaction_type, sender_name, receiver_name,
                amount, currency, channel_id, status, status_code, status_desc,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.reference_number)
        .bind(record.transaction_type.as_str())
        .bind(&record.sender_name)
        .bind(&record.receiver_name)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(&record.channel_id)
        .bind(record.status.as_str())
        .bind(&record.status_code)
        .bind(&record.status_desc)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.constraint() == Some(UNIQUE_KEY_CONSTRAINT)
            );
            if duplicate {
                RecordStoreError::DuplicateKey(key.clone())
            } else {
                RecordStoreError::Database(e)
            }
        })?;

        tracing::debug!(%key, "transaction record inserted");
        Ok(())
    }

    async fn fetch(&self, key: &TransactionKey) -> Result<Option<TransactionRecord>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM transaction_records \
             WHERE reference_number = $1 AND transaction_type = $2"
        ))
        .bind(&key.reference_number)
        .bind(key.transaction_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE transaction_records
            SET status = $3, status_code = $4, status_desc = $5, updated_at = $6
            WHERE reference_number = $1 AND transaction_type = $2
            "#,
        )
        .bind(&record.reference_number)
        .bind(record.transaction_type.as_str())
        .bind(record.status.as_str())
        .bind(&record.status_code)
        .bind(&record.status_desc)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RecordStoreError::NotFound(record.key()));
        }
        Ok(())
    }
}
