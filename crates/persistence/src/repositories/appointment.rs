//! Appointment repository for database operations.
//!
//! Every state transition is a conditional write keyed on the expected prior
//! status (and, where relevant, the expected decision holder or counter-offer
//! count). A transition that matches no row returns `None` instead of
//! overwriting concurrent work; the caller decides how to report the miss.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::ParticipantSide;

use crate::entities::AppointmentEntity;
use crate::metrics::QueryTimer;

/// Repository for appointment-related database operations.
#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new pending appointment with the decision on the invitee.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        match_id: Uuid,
        inviter_pet_id: Uuid,
        invitee_pet_id: Uuid,
        inviter_user_id: Uuid,
        invitee_user_id: Uuid,
        scheduled_at: DateTime<Utc>,
        location_id: Uuid,
        activity_type: &str,
    ) -> Result<AppointmentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            INSERT INTO appointments (
                match_id, inviter_pet_id, invitee_pet_id, inviter_user_id, invitee_user_id,
                scheduled_at, location_id, activity_type, current_decision_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $5)
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(match_id)
        .bind(inviter_pet_id)
        .bind(invitee_pet_id)
        .bind(inviter_user_id)
        .bind(invitee_user_id)
        .bind(scheduled_at)
        .bind(location_id)
        .bind(activity_type)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find an appointment by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_appointment_by_id");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all appointments belonging to a match, newest first.
    pub async fn list_by_match(
        &self,
        match_id: Uuid,
    ) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_appointments_by_match");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE match_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all appointments where the user participates on either side,
    /// soonest meeting first.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_appointments_by_user");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE inviter_user_id = $1 OR invitee_user_id = $1
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List the user's non-terminal appointments (for conflict scanning).
    pub async fn list_active_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_appointments_by_user");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE (inviter_user_id = $1 OR invitee_user_id = $1)
              AND status IN ('pending', 'confirmed', 'on_going')
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a live appointment for the same pet pair (either role order) with
    /// a proposed time inside `[window_start, window_end]`. Used as the
    /// creation de-duplication guard.
    pub async fn find_active_for_pet_pair(
        &self,
        pet_a: Uuid,
        pet_b: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_appointment_for_pet_pair");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE ((inviter_pet_id = $1 AND invitee_pet_id = $2)
                OR (inviter_pet_id = $2 AND invitee_pet_id = $1))
              AND status IN ('pending', 'confirmed', 'on_going')
              AND scheduled_at BETWEEN $3 AND $4
            LIMIT 1
            "#,
        )
        .bind(pet_a)
        .bind(pet_b)
        .bind(window_start)
        .bind(window_end)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Accept a pending appointment. Conditional on the row still being
    /// pending with the decision on `acting_user_id`.
    pub async fn confirm(
        &self,
        id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("confirm_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET status = 'confirmed', current_decision_user_id = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND current_decision_user_id = $2
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(acting_user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Decline a pending appointment. Same condition as `confirm`; records
    /// the actor and the mandatory reason.
    pub async fn decline(
        &self,
        id: Uuid,
        acting_user_id: Uuid,
        reason: &str,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("decline_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET status = 'cancelled', current_decision_user_id = NULL,
                cancelled_by = $2, cancel_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND current_decision_user_id = $2
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(acting_user_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Revise the proposal and flip the turn. Conditional on pending status,
    /// the decision being on `acting_user_id`, and the counter-offer count
    /// still matching the snapshot the caller validated against.
    #[allow(clippy::too_many_arguments)]
    pub async fn counter_offer(
        &self,
        id: Uuid,
        acting_user_id: Uuid,
        expected_counter_offer_count: i32,
        next_decision_user_id: Uuid,
        new_scheduled_at: Option<DateTime<Utc>>,
        new_location_id: Option<Uuid>,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("counter_offer_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET scheduled_at = COALESCE($5, scheduled_at),
                location_id = COALESCE($6, location_id),
                counter_offer_count = counter_offer_count + 1,
                current_decision_user_id = $4,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
              AND current_decision_user_id = $2
              AND counter_offer_count = $3
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(acting_user_id)
        .bind(expected_counter_offer_count)
        .bind(next_decision_user_id)
        .bind(new_scheduled_at)
        .bind(new_location_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Cancel from any non-terminal status, attributing the actor.
    pub async fn cancel(
        &self,
        id: Uuid,
        acting_user_id: Uuid,
        reason: &str,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("cancel_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET status = 'cancelled', current_decision_user_id = NULL,
                cancelled_by = $2, cancel_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'confirmed', 'on_going')
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(acting_user_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record one side's check-in. When the other side is already in, the
    /// same write promotes the row to on_going, so the promotion fires
    /// exactly once however the two calls interleave. Re-checking in is
    /// idempotent: the flag stays true and the timestamp refreshes.
    pub async fn check_in(
        &self,
        id: Uuid,
        side: ParticipantSide,
    ) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("check_in_appointment");
        let result = match side {
            ParticipantSide::Inviter => {
                sqlx::query_as::<_, AppointmentEntity>(
                    r#"
                    UPDATE appointments
                    SET inviter_checked_in = TRUE,
                        inviter_check_in_at = NOW(),
                        status = CASE WHEN invitee_checked_in
                                      THEN 'on_going'::appointment_status
                                      ELSE status END,
                        updated_at = NOW()
                    WHERE id = $1 AND status = 'confirmed'
                    RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                              invitee_user_id, scheduled_at, location_id, activity_type, status,
                              current_decision_user_id, counter_offer_count, inviter_checked_in,
                              invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                              cancelled_by, cancel_reason, created_at, updated_at
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
            ParticipantSide::Invitee => {
                sqlx::query_as::<_, AppointmentEntity>(
                    r#"
                    UPDATE appointments
                    SET invitee_checked_in = TRUE,
                        invitee_check_in_at = NOW(),
                        status = CASE WHEN inviter_checked_in
                                      THEN 'on_going'::appointment_status
                                      ELSE status END,
                        updated_at = NOW()
                    WHERE id = $1 AND status = 'confirmed'
                    RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                              invitee_user_id, scheduled_at, location_id, activity_type, status,
                              current_decision_user_id, counter_offer_count, inviter_checked_in,
                              invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                              cancelled_by, cancel_reason, created_at, updated_at
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
        };
        timer.record();
        result
    }

    /// Finish an on-going meetup. Used by the manual completion path and the
    /// sweeper's auto-complete alike.
    pub async fn mark_completed(&self, id: Uuid) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("complete_appointment");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status = 'on_going'
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sweep transition: a confirmed meetup nobody (or only one side) showed
    /// up for. No actor attribution; the transition is system-initiated.
    pub async fn mark_no_show(&self, id: Uuid) -> Result<Option<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_appointment_no_show");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            UPDATE appointments
            SET status = 'no_show', current_decision_user_id = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'confirmed'
              AND NOT (inviter_checked_in AND invitee_checked_in)
            RETURNING id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                      invitee_user_id, scheduled_at, location_id, activity_type, status,
                      current_decision_user_id, counter_offer_count, inviter_checked_in,
                      invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                      cancelled_by, cancel_reason, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Confirmed appointments whose meeting time passed `cutoff` without both
    /// parties checking in. Sweep candidates for NO_SHOW.
    pub async fn list_confirmed_overdue(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_confirmed_overdue");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE status = 'confirmed'
              AND scheduled_at < $1
              AND NOT (inviter_checked_in AND invitee_checked_in)
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// On-going appointments whose earliest check-in is older than `cutoff`.
    /// Sweep candidates for auto-completion.
    pub async fn list_on_going_overdue(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<AppointmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_on_going_overdue");
        let result = sqlx::query_as::<_, AppointmentEntity>(
            r#"
            SELECT id, match_id, inviter_pet_id, invitee_pet_id, inviter_user_id,
                   invitee_user_id, scheduled_at, location_id, activity_type, status,
                   current_decision_user_id, counter_offer_count, inviter_checked_in,
                   invitee_checked_in, inviter_check_in_at, invitee_check_in_at,
                   cancelled_by, cancel_reason, created_at, updated_at
            FROM appointments
            WHERE status = 'on_going'
              AND LEAST(inviter_check_in_at, invitee_check_in_at) < $1
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
