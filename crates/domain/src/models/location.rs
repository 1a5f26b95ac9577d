//! Meetup location domain model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A place where a meetup can happen. Owned by the location directory; the
/// engine reads the coordinates to validate check-ins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MeetupLocation {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_coordinates() {
        let location = MeetupLocation {
            id: Uuid::nil(),
            name: "Augarten dog zone".into(),
            address: "Obere Augartenstraße 1, 1020 Wien".into(),
            latitude: 48.2255,
            longitude: 16.3726,
            tags: vec!["off-leash".into()],
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&location).unwrap();
        assert!(json.contains("Augarten dog zone"));
        assert!(json.contains("48.2255"));
        assert!(json.contains("off-leash"));
    }
}
