//! Appointment domain models for the meetup negotiation workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of an appointment.
///
/// Allowed edges: `pending -> {confirmed, cancelled}`,
/// `confirmed -> {on_going, no_show, cancelled}`,
/// `on_going -> {completed, cancelled}`. The rest are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    OnGoing,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// True once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// True while the appointment still occupies the participants' schedules.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether `next` is reachable from `self` in a single transition.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, OnGoing)
                | (Confirmed, NoShow)
                | (Confirmed, Cancelled)
                | (OnGoing, Completed)
                | (OnGoing, Cancelled)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::OnGoing => write!(f, "on_going"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// What the two parties plan to do together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Walk,
    Cafe,
    Playdate,
    Park,
    Other,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Walk => "walk",
            ActivityType::Cafe => "cafe",
            ActivityType::Playdate => "playdate",
            ActivityType::Park => "park",
            ActivityType::Other => "other",
        }
    }

    /// Parses the stored text form; unknown values map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "walk" => ActivityType::Walk,
            "cafe" => ActivityType::Cafe,
            "playdate" => ActivityType::Playdate,
            "park" => ActivityType::Park,
            _ => ActivityType::Other,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the match a participant belongs to. The inviter is whoever
/// issued the original creation request; roles never swap during negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantSide {
    Inviter,
    Invitee,
}

impl ParticipantSide {
    pub fn other(&self) -> ParticipantSide {
        match self {
            ParticipantSide::Inviter => ParticipantSide::Invitee,
            ParticipantSide::Invitee => ParticipantSide::Inviter,
        }
    }
}

/// A proposed-then-negotiated meetup between two matched pet owners.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Appointment {
    pub id: Uuid,
    pub match_id: Uuid,
    pub inviter_pet_id: Uuid,
    pub invitee_pet_id: Uuid,
    pub inviter_user_id: Uuid,
    pub invitee_user_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub location_id: Uuid,
    pub activity_type: ActivityType,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_decision_user_id: Option<Uuid>,
    pub counter_offer_count: i32,
    pub inviter_checked_in: bool,
    pub invitee_checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inviter_check_in_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitee_check_in_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The side `user_id` occupies, if they participate at all.
    pub fn side_of(&self, user_id: Uuid) -> Option<ParticipantSide> {
        if user_id == self.inviter_user_id {
            Some(ParticipantSide::Inviter)
        } else if user_id == self.invitee_user_id {
            Some(ParticipantSide::Invitee)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.side_of(user_id).is_some()
    }

    /// The other party's user id, if `user_id` is a participant.
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        match self.side_of(user_id)? {
            ParticipantSide::Inviter => Some(self.invitee_user_id),
            ParticipantSide::Invitee => Some(self.inviter_user_id),
        }
    }

    pub fn checked_in(&self, side: ParticipantSide) -> bool {
        match side {
            ParticipantSide::Inviter => self.inviter_checked_in,
            ParticipantSide::Invitee => self.invitee_checked_in,
        }
    }

    pub fn both_checked_in(&self) -> bool {
        self.inviter_checked_in && self.invitee_checked_in
    }

    /// Both participants, inviter first. Used as notification recipients.
    pub fn participants(&self) -> [Uuid; 2] {
        [self.inviter_user_id, self.invitee_user_id]
    }
}

/// An appointment annotated with the advisory schedule-conflict flag.
///
/// The flag is computed at read time against the owner's other active
/// appointments and is never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AppointmentWithConflict {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub has_conflict: bool,
}

/// A caller-supplied place that is not yet in the location directory.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CustomLocationRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Address must be 1-200 characters"))]
    pub address: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// Request to create an appointment. Exactly one of `location_id` and
/// `custom_location` must be supplied, and `scheduled_at` must be a valid
/// future meeting time; the engine enforces both.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateAppointmentRequest {
    pub match_id: Uuid,
    pub inviter_pet_id: Uuid,
    pub invitee_pet_id: Uuid,

    pub scheduled_at: DateTime<Utc>,

    #[serde(default)]
    pub location_id: Option<Uuid>,

    #[serde(default)]
    #[validate(nested)]
    pub custom_location: Option<CustomLocationRequest>,

    pub activity_type: ActivityType,
}

/// Request to accept or decline a pending appointment. A decline requires a
/// non-empty reason.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RespondRequest {
    pub accept: bool,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_reason"))]
    pub decline_reason: Option<String>,
}

/// Request to revise the proposal. At least one field must be supplied, and
/// `new_location_id`/`new_custom_location` are mutually exclusive; the engine
/// enforces both rules.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CounterOfferRequest {
    #[serde(default)]
    pub new_scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub new_location_id: Option<Uuid>,

    #[serde(default)]
    #[validate(nested)]
    pub new_custom_location: Option<CustomLocationRequest>,
}

impl CounterOfferRequest {
    pub fn is_empty(&self) -> bool {
        self.new_scheduled_at.is_none()
            && self.new_location_id.is_none()
            && self.new_custom_location.is_none()
    }
}

/// Request to cancel an active appointment.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CancelAppointmentRequest {
    #[validate(custom(function = "shared::validation::validate_reason"))]
    pub reason: String,
}

/// GPS-validated presence confirmation at the meetup location.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

fn validate_optional_reason(reason: &str) -> Result<(), validator::ValidationError> {
    shared::validation::validate_reason(reason)
}
