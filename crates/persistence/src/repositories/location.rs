//! Meetup location repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MeetupLocationEntity;
use crate::metrics::QueryTimer;

/// Repository for meetup-location-related database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a location by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MeetupLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_location_by_id");
        let result = sqlx::query_as::<_, MeetupLocationEntity>(
            r#"
            SELECT id, name, address, latitude, longitude, tags, created_at
            FROM meetup_locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a caller-supplied place into the directory.
    pub async fn create(
        &self,
        name: &str,
        address: &str,
        latitude: f64,
        longitude: f64,
        tags: &[String],
    ) -> Result<MeetupLocationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_location");
        let result = sqlx::query_as::<_, MeetupLocationEntity>(
            r#"
            INSERT INTO meetup_locations (name, address, latitude, longitude, tags)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, address, latitude, longitude, tags, created_at
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .bind(tags)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
