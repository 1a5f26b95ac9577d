//! Turn-taking and transition guards for the appointment negotiation.
//!
//! These checks are pure: they inspect a snapshot of an [`Appointment`] and
//! decide whether an actor may perform an operation. The persistence layer
//! re-asserts the same preconditions in its conditional writes, so a guard
//! passing here never excuses a missing `WHERE status = ...` clause there.

use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus};

/// Why a requested transition is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionDenied {
    #[error("user is not a participant of this appointment")]
    NotParticipant,

    #[error("it is the other participant's turn to decide")]
    NotYourTurn,

    #[error("cannot {action} an appointment in status {status}")]
    InvalidState {
        status: AppointmentStatus,
        action: &'static str,
    },

    #[error("the counter-offer limit of {limit} has been reached")]
    CounterOfferLimitReached { limit: i32 },
}

fn ensure_participant(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    if appointment.is_participant(user_id) {
        Ok(())
    } else {
        Err(TransitionDenied::NotParticipant)
    }
}

fn ensure_status(
    appointment: &Appointment,
    expected: AppointmentStatus,
    action: &'static str,
) -> Result<(), TransitionDenied> {
    if appointment.status == expected {
        Ok(())
    } else {
        Err(TransitionDenied::InvalidState {
            status: appointment.status,
            action,
        })
    }
}

fn ensure_turn(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    if appointment.current_decision_user_id == Some(user_id) {
        Ok(())
    } else {
        Err(TransitionDenied::NotYourTurn)
    }
}

/// May `user_id` accept or decline? Pending only, and only on their turn.
pub fn check_respond(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    ensure_participant(appointment, user_id)?;
    ensure_status(appointment, AppointmentStatus::Pending, "respond to")?;
    ensure_turn(appointment, user_id)
}

/// May `user_id` revise the proposal? Pending, their turn, and under the
/// configured counter-offer bound.
pub fn check_counter_offer(
    appointment: &Appointment,
    user_id: Uuid,
    max_counter_offers: i32,
) -> Result<(), TransitionDenied> {
    ensure_participant(appointment, user_id)?;
    ensure_status(appointment, AppointmentStatus::Pending, "counter-offer on")?;
    ensure_turn(appointment, user_id)?;
    if appointment.counter_offer_count >= max_counter_offers {
        return Err(TransitionDenied::CounterOfferLimitReached {
            limit: max_counter_offers,
        });
    }
    Ok(())
}

/// May `user_id` cancel? Either participant, any time before a terminal state.
pub fn check_cancel(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    ensure_participant(appointment, user_id)?;
    if appointment.status.is_terminal() {
        return Err(TransitionDenied::InvalidState {
            status: appointment.status,
            action: "cancel",
        });
    }
    Ok(())
}

/// May `user_id` check in? Confirmed only; geo validation is the caller's.
pub fn check_check_in(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    ensure_participant(appointment, user_id)?;
    ensure_status(appointment, AppointmentStatus::Confirmed, "check in to")
}

/// May `user_id` mark the meetup finished? On-going only, either participant.
pub fn check_complete(appointment: &Appointment, user_id: Uuid) -> Result<(), TransitionDenied> {
    ensure_participant(appointment, user_id)?;
    ensure_status(appointment, AppointmentStatus::OnGoing, "complete")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityType;
    use chrono::{Duration, Utc};

    fn appointment(status: AppointmentStatus) -> Appointment {
        let inviter = Uuid::new_v4();
        let invitee = Uuid::new_v4();
        Appointment {
            id: Uuid::new_v4(),
            match_id: Uuid::new_v4(),
            inviter_pet_id: Uuid::new_v4(),
            invitee_pet_id: Uuid::new_v4(),
            inviter_user_id: inviter,
            invitee_user_id: invitee,
            scheduled_at: Utc::now() + Duration::days(7),
            location_id: Uuid::new_v4(),
            activity_type: ActivityType::Park,
            status,
            current_decision_user_id: match status {
                AppointmentStatus::Pending => Some(invitee),
                _ => None,
            },
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

    #[test]
    fn test_respond_allowed_for_decision_holder() {
        let appt = appointment(AppointmentStatus::Pending);
        assert!(check_respond(&appt, appt.invitee_user_id).is_ok());
    }

    #[test]
    fn test_respond_denied_for_inviter_while_invitee_holds_turn() {
        let appt = appointment(AppointmentStatus::Pending);
        assert_eq!(
            check_respond(&appt, appt.inviter_user_id),
            Err(TransitionDenied::NotYourTurn)
        );
    }

    #[test]
    fn test_respond_denied_for_stranger() {
        let appt = appointment(AppointmentStatus::Pending);
        assert_eq!(
            check_respond(&appt, Uuid::new_v4()),
            Err(TransitionDenied::NotParticipant)
        );
    }

    #[test]
    fn test_respond_denied_outside_pending() {
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::OnGoing,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            let appt = appointment(status);
            assert!(matches!(
                check_respond(&appt, appt.invitee_user_id),
                Err(TransitionDenied::InvalidState { .. })
            ));
        }
    }

    #[test]
    fn test_counter_offer_allowed_under_limit() {
        let mut appt = appointment(AppointmentStatus::Pending);
        appt.counter_offer_count = 2;
        assert!(check_counter_offer(&appt, appt.invitee_user_id, 3).is_ok());
    }

    #[test]
    fn test_counter_offer_denied_at_limit() {
        let mut appt = appointment(AppointmentStatus::Pending);
        appt.counter_offer_count = 3;
        assert_eq!(
            check_counter_offer(&appt, appt.invitee_user_id, 3),
            Err(TransitionDenied::CounterOfferLimitReached { limit: 3 })
        );
    }

    #[test]
    fn test_counter_offer_turn_check_precedes_limit() {
        let mut appt = appointment(AppointmentStatus::Pending);
        appt.counter_offer_count = 3;
        assert_eq!(
            check_counter_offer(&appt, appt.inviter_user_id, 3),
            Err(TransitionDenied::NotYourTurn)
        );
    }

    #[test]
    fn test_cancel_allowed_from_all_active_states_for_both_parties() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::OnGoing,
        ] {
            let appt = appointment(status);
            assert!(check_cancel(&appt, appt.inviter_user_id).is_ok());
            assert!(check_cancel(&appt, appt.invitee_user_id).is_ok());
        }
    }

    #[test]
    fn test_cancel_denied_once_terminal() {
        for status in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            let appt = appointment(status);
            assert!(matches!(
                check_cancel(&appt, appt.inviter_user_id),
                Err(TransitionDenied::InvalidState { .. })
            ));
        }
    }

    #[test]
    fn test_check_in_only_while_confirmed() {
        let appt = appointment(AppointmentStatus::Confirmed);
        assert!(check_check_in(&appt, appt.inviter_user_id).is_ok());
        assert!(check_check_in(&appt, appt.invitee_user_id).is_ok());

        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::OnGoing,
            AppointmentStatus::Completed,
        ] {
            let appt = appointment(status);
            assert!(matches!(
                check_check_in(&appt, appt.inviter_user_id),
                Err(TransitionDenied::InvalidState { .. })
            ));
        }
    }

    #[test]
    fn test_complete_only_while_on_going() {
        let appt = appointment(AppointmentStatus::OnGoing);
        assert!(check_complete(&appt, appt.invitee_user_id).is_ok());

        let appt = appointment(AppointmentStatus::Confirmed);
        assert!(matches!(
            check_complete(&appt, appt.inviter_user_id),
            Err(TransitionDenied::InvalidState { .. })
        ));
    }

    #[test]
    fn test_denied_messages_are_descriptive() {
        let appt = appointment(AppointmentStatus::Cancelled);
        let err = check_cancel(&appt, appt.inviter_user_id).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot cancel an appointment in status cancelled"
        );
    }
}
