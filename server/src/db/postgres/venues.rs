use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::VenueRepository;
use crate::models::Venue;
use crate::utils::error::AppError;

const VENUE_COLUMNS: &str =
    "id, organizer_id, name, address, city, capacity, created_at, updated_at";

pub struct PgVenueRepository {
    pool: PgPool,
}

impl PgVenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PgVenueRepository {
    async fn insert(&self, venue: &Venue) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO venues (id, organizer_id, name, address, city, capacity, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(venue.id)
        .bind(venue.organizer_id)
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(venue.capacity)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Venue>, AppError> {
        let venue = sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(venue)
    }

    async fn list_by_organizer(&self, organizer_id: Uuid) -> Result<Vec<Venue>, AppError> {
        let venues = sqlx::query_as::<_, Venue>(&format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE organizer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(venues)
    }

    async fn update(&self, venue: &Venue) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE venues
                SET name = $3, address = $4, city = $5, capacity = $6, updated_at = $7
              WHERE id = $1 AND organizer_id = $2",
        )
        .bind(venue.id)
        .bind(venue.organizer_id)
        .bind(&venue.name)
        .bind(&venue.address)
        .bind(&venue.city)
        .bind(venue.capacity)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, organizer_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1 AND organizer_id = $2")
            .bind(id)
            .bind(organizer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
