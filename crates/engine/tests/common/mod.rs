//! Common test utilities for integration tests.
//!
//! These tests run against a real PostgreSQL database named by the
//! `TEST_DATABASE_URL` environment variable. When the variable is unset the
//! suites skip instead of failing, so unit-test-only environments stay green.

// Allow dead code in this module - these are helper utilities that may not be used
// by all integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use fake::faker::address::en::{CityName, StreetName};
use fake::Fake;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{
    ActivityType, Appointment, CheckInRequest, CreateAppointmentRequest, CustomLocationRequest,
    RespondRequest,
};
use domain::services::directory::StaticMatchDirectory;
use domain::services::notification::RecordingNotifier;
use petmeet_engine::config::SchedulingConfig;
use petmeet_engine::engine::SchedulingEngine;

/// Coordinates of the canonical test meetup spot.
pub const LOCATION_LAT: f64 = 48.2255;
pub const LOCATION_LON: f64 = 16.3726;

/// ~80 m north of the meetup spot - inside the 200 m geo-fence.
pub const NEARBY_LAT: f64 = 48.2262;
/// ~5 km north of the meetup spot - far outside the geo-fence.
pub const FARAWAY_LAT: f64 = 48.2705;

pub struct TestRig {
    pub pool: PgPool,
    pub engine: SchedulingEngine,
    pub directory: Arc<StaticMatchDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub match_id: Uuid,
    pub inviter_user: Uuid,
    pub inviter_pet: Uuid,
    pub invitee_user: Uuid,
    pub invitee_pet: Uuid,
}

impl TestRig {
    /// Build a rig with default scheduling settings, or `None` when no test
    /// database is configured.
    pub async fn try_new() -> Option<TestRig> {
        Self::try_with_config(SchedulingConfig::default()).await
    }

    pub async fn try_with_config(config: SchedulingConfig) -> Option<TestRig> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping integration test");
                return None;
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(StdDuration::from_secs(30))
            .connect(&url)
            .await
            .expect("Failed to connect to test database");

        persistence::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let directory = Arc::new(StaticMatchDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let match_id = Uuid::new_v4();
        let inviter_user = Uuid::new_v4();
        let inviter_pet = Uuid::new_v4();
        let invitee_user = Uuid::new_v4();
        let invitee_pet = Uuid::new_v4();
        directory.add_match(
            match_id,
            (inviter_user, inviter_pet),
            (invitee_user, invitee_pet),
        );

        let engine = SchedulingEngine::new(
            pool.clone(),
            directory.clone(),
            notifier.clone(),
            config,
        );

        Some(TestRig {
            pool,
            engine,
            directory,
            notifier,
            match_id,
            inviter_user,
            inviter_pet,
            invitee_user,
            invitee_pet,
        })
    }

    /// A creation request for the rig's match, with a fresh custom location
    /// at the canonical coordinates.
    pub fn create_request(&self, scheduled_at: DateTime<Utc>) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            match_id: self.match_id,
            inviter_pet_id: self.inviter_pet,
            invitee_pet_id: self.invitee_pet,
            scheduled_at,
            location_id: None,
            custom_location: Some(custom_location()),
            activity_type: ActivityType::Walk,
        }
    }

    /// Create a pending appointment scheduled two days out.
    pub async fn create_pending(&self) -> Appointment {
        self.engine
            .create_appointment(
                self.inviter_user,
                self.create_request(Utc::now() + Duration::days(2)),
            )
            .await
            .expect("create_appointment failed")
    }

    /// Create and accept, yielding a confirmed appointment.
    pub async fn create_confirmed(&self) -> Appointment {
        let pending = self.create_pending().await;
        self.engine
            .respond(pending.id, self.invitee_user, accept())
            .await
            .expect("accept failed")
    }

    /// Create, accept, and check both parties in, yielding an on-going
    /// appointment.
    pub async fn create_on_going(&self) -> Appointment {
        let confirmed = self.create_confirmed().await;
        self.engine
            .check_in(confirmed.id, self.inviter_user, nearby())
            .await
            .expect("inviter check-in failed");
        self.engine
            .check_in(confirmed.id, self.invitee_user, nearby())
            .await
            .expect("invitee check-in failed")
    }

    /// Rewrite the proposed meeting time, bypassing validation. Used to age
    /// rows into sweep range.
    pub async fn backdate_scheduled_at(&self, id: Uuid, minutes_ago: i64) {
        let t = Utc::now() - Duration::minutes(minutes_ago);
        sqlx::query("UPDATE appointments SET scheduled_at = $2 WHERE id = $1")
            .bind(id)
            .bind(t)
            .execute(&self.pool)
            .await
            .expect("backdate failed");
    }

    /// Rewrite both check-in timestamps. Used to age on-going rows into
    /// auto-complete range.
    pub async fn backdate_check_ins(&self, id: Uuid, minutes_ago: i64) {
        let t = Utc::now() - Duration::minutes(minutes_ago);
        sqlx::query(
            "UPDATE appointments SET inviter_check_in_at = $2, invitee_check_in_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(t)
        .execute(&self.pool)
        .await
        .expect("backdate failed");
    }

    /// Fresh snapshot of an appointment.
    pub async fn reload(&self, id: Uuid) -> Appointment {
        self.engine
            .get_appointment(id)
            .await
            .expect("get_appointment failed")
            .expect("appointment missing")
    }
}

pub fn custom_location() -> CustomLocationRequest {
    CustomLocationRequest {
        name: format!("{} Dog Run", CityName().fake::<String>()),
        address: format!("{} 1", StreetName().fake::<String>()),
        latitude: LOCATION_LAT,
        longitude: LOCATION_LON,
    }
}

pub fn accept() -> RespondRequest {
    RespondRequest {
        accept: true,
        decline_reason: None,
    }
}

pub fn decline(reason: &str) -> RespondRequest {
    RespondRequest {
        accept: false,
        decline_reason: Some(reason.to_string()),
    }
}

pub fn nearby() -> CheckInRequest {
    CheckInRequest {
        latitude: NEARBY_LAT,
        longitude: LOCATION_LON,
    }
}

pub fn faraway() -> CheckInRequest {
    CheckInRequest {
        latitude: FARAWAY_LAT,
        longitude: LOCATION_LON,
    }
}
