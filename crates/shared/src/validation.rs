//! Common validation utilities.

use chrono::{DateTime, Duration, Utc};
use validator::ValidationError;

/// Maximum length of a user-supplied cancel or decline reason.
pub const MAX_REASON_LENGTH: usize = 500;

/// How far into the future a meeting may be proposed (days).
const MAX_SCHEDULING_HORIZON_DAYS: i64 = 90;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates a free-text reason: non-empty after trimming, bounded length.
pub fn validate_reason(reason: &str) -> Result<(), ValidationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("reason_empty");
        err.message = Some("Reason must not be empty".into());
        return Err(err);
    }
    if trimmed.len() > MAX_REASON_LENGTH {
        let mut err = ValidationError::new("reason_too_long");
        err.message = Some("Reason must be at most 500 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a proposed meeting time is in the future but within the
/// scheduling horizon.
pub fn validate_meeting_time(scheduled_at: DateTime<Utc>) -> Result<(), ValidationError> {
    let now = Utc::now();
    if scheduled_at <= now {
        let mut err = ValidationError::new("meeting_time_past");
        err.message = Some("Meeting time must be in the future".into());
        return Err(err);
    }
    if scheduled_at > now + Duration::days(MAX_SCHEDULING_HORIZON_DAYS) {
        let mut err = ValidationError::new("meeting_time_horizon");
        err.message = Some("Meeting time must be within 90 days".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_longitude_error_message() {
        let err = validate_longitude(200.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Longitude must be between -180 and 180"
        );
    }

    #[test]
    fn test_validate_reason_rejects_empty() {
        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason("\t\n").is_err());
    }

    #[test]
    fn test_validate_reason_accepts_normal_text() {
        assert!(validate_reason("Something came up, sorry!").is_ok());
        assert!(validate_reason("a").is_ok());
    }

    #[test]
    fn test_validate_reason_rejects_too_long() {
        let long = "x".repeat(MAX_REASON_LENGTH + 1);
        assert!(validate_reason(&long).is_err());
        let max = "x".repeat(MAX_REASON_LENGTH);
        assert!(validate_reason(&max).is_ok());
    }

    #[test]
    fn test_validate_meeting_time_future() {
        let tomorrow = Utc::now() + Duration::days(1);
        assert!(validate_meeting_time(tomorrow).is_ok());
    }

    #[test]
    fn test_validate_meeting_time_rejects_past() {
        let yesterday = Utc::now() - Duration::days(1);
        assert!(validate_meeting_time(yesterday).is_err());
        assert!(validate_meeting_time(Utc::now() - Duration::seconds(5)).is_err());
    }

    #[test]
    fn test_validate_meeting_time_rejects_beyond_horizon() {
        let far = Utc::now() + Duration::days(91);
        assert!(validate_meeting_time(far).is_err());
        let near_edge = Utc::now() + Duration::days(89);
        assert!(validate_meeting_time(near_edge).is_ok());
    }
}
