use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::PaymentConfigRepository;
use crate::models::PaymentConfig;
use crate::utils::error::AppError;

pub struct PgPaymentConfigRepository {
    pool: PgPool,
}

impl PgPaymentConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentConfigRepository for PgPaymentConfigRepository {
    async fn find(&self, organizer_id: Uuid) -> Result<Option<PaymentConfig>, AppError> {
        let config = sqlx::query_as::<_, PaymentConfig>(
            "SELECT organizer_id, key_id, encrypted_secret, created_at, updated_at
               FROM payment_configs WHERE organizer_id = $1",
        )
        .bind(organizer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(config)
    }

    async fn upsert(&self, config: &PaymentConfig) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payment_configs (organizer_id, key_id, encrypted_secret, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (organizer_id) DO UPDATE
                SET key_id = EXCLUDED.key_id,
                    encrypted_secret = EXCLUDED.encrypted_secret,
                    updated_at = EXCLUDED.updated_at",
        )
        .bind(config.organizer_id)
        .bind(&config.key_id)
        .bind(&config.encrypted_secret)
        .bind(config.created_at)
        .bind(config.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, organizer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM payment_configs WHERE organizer_id = $1")
            .bind(organizer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
