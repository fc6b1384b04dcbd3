use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::UserRepository;
use crate::models::User;
use crate::utils::error::AppError;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, currency, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn upsert(&self, user: &User) -> Result<User, AppError> {
        let stored = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, currency, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    email = EXCLUDED.email,
                    currency = EXCLUDED.currency,
                    updated_at = EXCLUDED.updated_at
             RETURNING id, name, email, currency, created_at, updated_at",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.currency)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }
}
