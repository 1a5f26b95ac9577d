//! Advisory schedule-conflict detection.
//!
//! A conflict is an overlap between a candidate meeting time and one of the
//! user's other non-terminal appointments, within a symmetric tolerance. It
//! never blocks anything; it is surfaced as a read-time annotation and never
//! persisted.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use domain::models::{Appointment, AppointmentWithConflict};
use persistence::repositories::AppointmentRepository;

/// Two meeting times overlap when they are within `window` of each other.
pub fn times_overlap(a: DateTime<Utc>, b: DateTime<Utc>, window: Duration) -> bool {
    (a - b).abs() <= window
}

/// Annotates an appointment list with pairwise conflict flags. Terminal
/// appointments never conflict, in either direction.
pub fn annotate_conflicts(
    appointments: Vec<Appointment>,
    window: Duration,
) -> Vec<AppointmentWithConflict> {
    let flags: Vec<bool> = appointments
        .iter()
        .map(|candidate| {
            candidate.status.is_active()
                && appointments.iter().any(|other| {
                    other.id != candidate.id
                        && other.status.is_active()
                        && times_overlap(other.scheduled_at, candidate.scheduled_at, window)
                })
        })
        .collect();

    appointments
        .into_iter()
        .zip(flags)
        .map(|(appointment, has_conflict)| AppointmentWithConflict {
            appointment,
            has_conflict,
        })
        .collect()
}

/// Read-only conflict scanner over a user's active appointments.
#[derive(Clone)]
pub struct ConflictDetector {
    appointments: AppointmentRepository,
    window: Duration,
}

impl ConflictDetector {
    pub fn new(appointments: AppointmentRepository, window_minutes: i64) -> Self {
        Self {
            appointments,
            window: Duration::minutes(window_minutes),
        }
    }

    /// Whether `candidate_start` collides with any of the user's active
    /// appointments, optionally ignoring one appointment (the candidate
    /// itself when re-checking an existing row).
    pub async fn has_conflict(
        &self,
        user_id: Uuid,
        candidate_start: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        let active = self.appointments.list_active_by_user(user_id).await?;
        Ok(active
            .iter()
            .filter(|a| Some(a.id) != exclude)
            .any(|a| times_overlap(a.scheduled_at, candidate_start, self.window)))
    }

    /// Annotates a user's appointment list with conflict flags.
    pub fn annotate(&self, appointments: Vec<Appointment>) -> Vec<AppointmentWithConflict> {
        annotate_conflicts(appointments, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{ActivityType, AppointmentStatus};

    #[test]
    fn test_times_overlap_symmetric_window() {
        let window = Duration::minutes(60);
        let base = Utc::now();
        assert!(times_overlap(base, base, window));
        assert!(times_overlap(base, base + Duration::minutes(59), window));
        assert!(times_overlap(base, base - Duration::minutes(60), window));
        assert!(!times_overlap(base, base + Duration::minutes(61), window));
        assert!(!times_overlap(base, base - Duration::minutes(61), window));
    }

    fn appointment(status: AppointmentStatus, scheduled_at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            inviter_pet_id: Uuid::new_v4(),
            invitee_pet_id: Uuid::new_v4(),
            inviter_user_id: Uuid::new_v4(),
            invitee_user_id: Uuid::new_v4(),
            scheduled_at,
            location_id: Uuid::new_v4(),
            activity_type: ActivityType::Walk,
            status,
            current_decision_user_id: None,
            counter_offer_count: 0,
            inviter_checked_in: false,
            invitee_checked_in: false,
            inviter_check_in_at: None,
            invitee_check_in_at: None,
            cancelled_by: None,
            cancel_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn flags(appointments: Vec<Appointment>) -> Vec<bool> {
        annotate_conflicts(appointments, Duration::minutes(60))
            .into_iter()
            .map(|a| a.has_conflict)
            .collect()
    }

    #[test]
    fn test_annotate_flags_overlapping_pair() {
        let base = Utc::now() + Duration::days(1);
        let result = flags(vec![
            appointment(AppointmentStatus::Pending, base),
            appointment(AppointmentStatus::Confirmed, base + Duration::minutes(30)),
        ]);
        assert_eq!(result, vec![true, true]);
    }

    #[test]
    fn test_annotate_ignores_distant_appointments() {
        let base = Utc::now() + Duration::days(1);
        let result = flags(vec![
            appointment(AppointmentStatus::Pending, base),
            appointment(AppointmentStatus::Pending, base + Duration::hours(3)),
        ]);
        assert_eq!(result, vec![false, false]);
    }

    #[test]
    fn test_annotate_terminal_rows_never_conflict() {
        let base = Utc::now() + Duration::days(1);
        let result = flags(vec![
            appointment(AppointmentStatus::Cancelled, base),
            appointment(AppointmentStatus::Pending, base),
        ]);
        // The cancelled row neither carries nor causes a conflict
        assert_eq!(result, vec![false, false]);
    }

    #[test]
    fn test_annotate_mixed() {
        let base = Utc::now() + Duration::days(1);
        let result = flags(vec![
            appointment(AppointmentStatus::Pending, base),
            appointment(AppointmentStatus::OnGoing, base + Duration::minutes(45)),
            appointment(AppointmentStatus::Confirmed, base + Duration::hours(5)),
        ]);
        assert_eq!(result, vec![true, true, false]);
    }

    #[test]
    fn test_annotate_empty_list() {
        assert!(flags(vec![]).is_empty());
    }
}
