//! Meetup location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::MeetupLocation;

/// Database row mapping for the meetup_locations table.
#[derive(Debug, Clone, FromRow)]
pub struct MeetupLocationEntity {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MeetupLocationEntity> for MeetupLocation {
    fn from(e: MeetupLocationEntity) -> Self {
        MeetupLocation {
            id: e.id,
            name: e.name,
            address: e.address,
            latitude: e.latitude,
            longitude: e.longitude,
            tags: e.tags,
            created_at: e.created_at,
        }
    }
}
