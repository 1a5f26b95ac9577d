//! Appointment entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{ActivityType, Appointment, AppointmentStatus};

/// Database enum for appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
pub enum AppointmentStatusDb {
    Pending,
    Confirmed,
    OnGoing,
    Completed,
    Cancelled,
    NoShow,
}

impl From<AppointmentStatusDb> for AppointmentStatus {
    fn from(status: AppointmentStatusDb) -> Self {
        match status {
            AppointmentStatusDb::Pending => AppointmentStatus::Pending,
            AppointmentStatusDb::Confirmed => AppointmentStatus::Confirmed,
            AppointmentStatusDb::OnGoing => AppointmentStatus::OnGoing,
            AppointmentStatusDb::Completed => AppointmentStatus::Completed,
            AppointmentStatusDb::Cancelled => AppointmentStatus::Cancelled,
            AppointmentStatusDb::NoShow => AppointmentStatus::NoShow,
        }
    }
}

impl From<AppointmentStatus> for AppointmentStatusDb {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Pending => AppointmentStatusDb::Pending,
            AppointmentStatus::Confirmed => AppointmentStatusDb::Confirmed,
            AppointmentStatus::OnGoing => AppointmentStatusDb::OnGoing,
            AppointmentStatus::Completed => AppointmentStatusDb::Completed,
            AppointmentStatus::Cancelled => AppointmentStatusDb::Cancelled,
            AppointmentStatus::NoShow => AppointmentStatusDb::NoShow,
        }
    }
}

/// Database row mapping for the appointments table.
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentEntity {
    pub id: Uuid,
    pub match_id: Uuid,
    pub inviter_pet_id: Uuid,
    pub invitee_pet_id: Uuid,
    pub inviter_user_id: Uuid,
    pub invitee_user_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub location_id: Uuid,
    pub activity_type: String,
    pub status: AppointmentStatusDb,
    pub current_decision_user_id: Option<Uuid>,
    pub counter_offer_count: i32,
    pub inviter_checked_in: bool,
    pub invitee_checked_in: bool,
    pub inviter_check_in_at: Option<DateTime<Utc>>,
    pub invitee_check_in_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentEntity> for Appointment {
    fn from(e: AppointmentEntity) -> Self {
        Appointment {
            id: e.id,
            match_id: e.match_id,
            inviter_pet_id: e.inviter_pet_id,
            invitee_pet_id: e.invitee_pet_id,
            inviter_user_id: e.inviter_user_id,
            invitee_user_id: e.invitee_user_id,
            scheduled_at: e.scheduled_at,
            location_id: e.location_id,
            activity_type: ActivityType::parse(&e.activity_type),
            status: e.status.into(),
            current_decision_user_id: e.current_decision_user_id,
            counter_offer_count: e.counter_offer_count,
            inviter_checked_in: e.inviter_checked_in,
            invitee_checked_in: e.invitee_checked_in,
            inviter_check_in_at: e.inviter_check_in_at,
            invitee_check_in_at: e.invitee_check_in_at,
            cancelled_by: e.cancelled_by,
            cancel_reason: e.cancel_reason,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}
