//! The scheduling engine facade.
//!
//! Composes precondition validation, the negotiation rules, the repositories,
//! and notification dispatch into the operation surface consumed by the
//! transport layer. Every state transition is performed as a conditional
//! write; when such a write matches no row the engine re-reads the
//! appointment and reports the most precise error it can.

pub mod conflict;
pub mod sweeper;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use domain::models::{
    Appointment, AppointmentStatus, AppointmentWithConflict, CancelAppointmentRequest,
    CheckInRequest, CounterOfferRequest, CreateAppointmentRequest, CustomLocationRequest,
    MeetupLocation, RespondRequest,
};
use domain::services::directory::MatchDirectory;
use domain::services::negotiation::{self, TransitionDenied};
use domain::services::notification::{
    AppointmentNotifier, NotificationResult, TransitionNotification,
};
use domain::services::preconditions::PreconditionValidator;
use persistence::repositories::{AppointmentRepository, LocationRepository};

use crate::config::SchedulingConfig;
use crate::error::EngineError;

pub use conflict::ConflictDetector;
pub use sweeper::{ExpirySweeper, SweepOutcome};

/// Fire-and-forget notification dispatch for a committed transition. A
/// delivery failure is logged and never affects the transition.
pub(crate) fn dispatch_transition(
    notifier: &Arc<dyn AppointmentNotifier>,
    appointment: &Appointment,
) {
    let notifier = Arc::clone(notifier);
    let notification = TransitionNotification {
        appointment_id: appointment.id,
        status: appointment.status,
        recipients: appointment.participants().to_vec(),
        occurred_at: appointment.updated_at,
    };
    tokio::spawn(async move {
        let appointment_id = notification.appointment_id;
        if let NotificationResult::Failed(reason) = notifier.notify_transition(notification).await
        {
            warn!(
                appointment_id = %appointment_id,
                reason = %reason,
                "transition notification dispatch failed"
            );
        }
    });
}

/// The public contract of the appointment negotiation and scheduling core.
#[derive(Clone)]
pub struct SchedulingEngine {
    appointments: AppointmentRepository,
    locations: LocationRepository,
    preconditions: PreconditionValidator,
    conflicts: ConflictDetector,
    sweeper: ExpirySweeper,
    notifier: Arc<dyn AppointmentNotifier>,
    config: SchedulingConfig,
}

impl SchedulingEngine {
    pub fn new(
        pool: PgPool,
        directory: Arc<dyn MatchDirectory>,
        notifier: Arc<dyn AppointmentNotifier>,
        config: SchedulingConfig,
    ) -> Self {
        let appointments = AppointmentRepository::new(pool.clone());
        Self {
            locations: LocationRepository::new(pool.clone()),
            preconditions: PreconditionValidator::new(directory),
            conflicts: ConflictDetector::new(appointments.clone(), config.conflict_window_minutes),
            sweeper: ExpirySweeper::new(pool, Arc::clone(&notifier), config.grace_period_minutes),
            appointments,
            notifier,
            config,
        }
    }

    /// Propose a meetup. The new appointment starts pending with the decision
    /// on the invitee.
    pub async fn create_appointment(
        &self,
        user_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, EngineError> {
        request.validate()?;
        shared::validation::validate_meeting_time(request.scheduled_at)?;

        let parties = self
            .preconditions
            .validate(
                request.match_id,
                user_id,
                request.inviter_pet_id,
                request.invitee_pet_id,
            )
            .await?;

        let dedup_window = Duration::minutes(self.config.dedup_window_minutes);
        if let Some(existing) = self
            .appointments
            .find_active_for_pet_pair(
                request.inviter_pet_id,
                request.invitee_pet_id,
                request.scheduled_at - dedup_window,
                request.scheduled_at + dedup_window,
            )
            .await?
        {
            return Err(EngineError::InvalidPrecondition(format!(
                "an active appointment for this pet pair already exists around that time ({})",
                existing.scheduled_at
            )));
        }

        let location_id = self
            .resolve_location(request.location_id, request.custom_location.as_ref())
            .await?;

        let entity = self
            .appointments
            .create(
                request.match_id,
                request.inviter_pet_id,
                request.invitee_pet_id,
                parties.inviter_user_id,
                parties.invitee_user_id,
                request.scheduled_at,
                location_id,
                request.activity_type.as_str(),
            )
            .await?;
        let appointment: Appointment = entity.into();

        info!(
            appointment_id = %appointment.id,
            match_id = %appointment.match_id,
            scheduled_at = %appointment.scheduled_at,
            activity = %appointment.activity_type,
            "appointment created"
        );
        metrics::counter!("appointments_created_total").increment(1);
        dispatch_transition(&self.notifier, &appointment);
        Ok(appointment)
    }

    /// Fetch a single appointment.
    pub async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, EngineError> {
        Ok(self
            .appointments
            .find_by_id(id)
            .await?
            .map(Appointment::from))
    }

    /// All appointments negotiated within a match, newest first.
    pub async fn list_by_match(&self, match_id: Uuid) -> Result<Vec<Appointment>, EngineError> {
        Ok(self
            .appointments
            .list_by_match(match_id)
            .await?
            .into_iter()
            .map(Appointment::from)
            .collect())
    }

    /// A user's appointments, each annotated with the advisory conflict flag.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AppointmentWithConflict>, EngineError> {
        let appointments: Vec<Appointment> = self
            .appointments
            .list_by_user(user_id)
            .await?
            .into_iter()
            .map(Appointment::from)
            .collect();
        Ok(self.conflicts.annotate(appointments))
    }

    /// Accept or decline a pending appointment. Only the decision holder may
    /// respond; declining requires a reason.
    pub async fn respond(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: RespondRequest,
    ) -> Result<Appointment, EngineError> {
        request.validate()?;

        let appointment = self.require(id).await?;
        negotiation::check_respond(&appointment, user_id)?;

        let row = if request.accept {
            self.appointments.confirm(id, user_id).await?
        } else {
            let reason = request
                .decline_reason
                .as_deref()
                .map(str::trim)
                .unwrap_or_default();
            if reason.is_empty() {
                return Err(EngineError::Validation(
                    "a decline reason is required".into(),
                ));
            }
            self.appointments.decline(id, user_id, reason).await?
        };

        match row {
            Some(entity) => {
                let appointment: Appointment = entity.into();
                info!(
                    appointment_id = %appointment.id,
                    status = %appointment.status,
                    "appointment responded to"
                );
                dispatch_transition(&self.notifier, &appointment);
                Ok(appointment)
            }
            None => Err(self
                .classify_miss(id, |current| negotiation::check_respond(current, user_id))
                .await),
        }
    }

    /// Revise the proposed time and/or place, flipping the turn to the other
    /// party. Bounded by the configured counter-offer limit.
    pub async fn counter_offer(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: CounterOfferRequest,
    ) -> Result<Appointment, EngineError> {
        request.validate()?;
        if request.is_empty() {
            return Err(EngineError::Validation(
                "a counter-offer must change the time or the place".into(),
            ));
        }
        if let Some(new_scheduled_at) = request.new_scheduled_at {
            shared::validation::validate_meeting_time(new_scheduled_at)?;
        }

        let appointment = self.require(id).await?;
        negotiation::check_counter_offer(&appointment, user_id, self.config.max_counter_offers)?;

        let next_decision_user_id = if user_id == appointment.inviter_user_id {
            appointment.invitee_user_id
        } else {
            appointment.inviter_user_id
        };

        let new_location_id = match (request.new_location_id, request.new_custom_location.as_ref())
        {
            (Some(_), Some(_)) => {
                return Err(EngineError::Validation(
                    "supply either new_location_id or new_custom_location, not both".into(),
                ))
            }
            (Some(location_id), None) => {
                self.require_location(location_id).await?;
                Some(location_id)
            }
            (None, Some(custom)) => Some(self.create_location(custom).await?),
            (None, None) => None,
        };

        let max_counter_offers = self.config.max_counter_offers;
        match self
            .appointments
            .counter_offer(
                id,
                user_id,
                appointment.counter_offer_count,
                next_decision_user_id,
                request.new_scheduled_at,
                new_location_id,
            )
            .await?
        {
            Some(entity) => {
                let appointment: Appointment = entity.into();
                info!(
                    appointment_id = %appointment.id,
                    counter_offer_count = appointment.counter_offer_count,
                    "counter-offer recorded, turn flipped"
                );
                dispatch_transition(&self.notifier, &appointment);
                Ok(appointment)
            }
            None => Err(self
                .classify_miss(id, |current| {
                    negotiation::check_counter_offer(current, user_id, max_counter_offers)
                })
                .await),
        }
    }

    /// Cancel an active appointment. Either participant, any time before a
    /// terminal state; a reason is mandatory.
    pub async fn cancel(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, EngineError> {
        request.validate()?;

        let appointment = self.require(id).await?;
        negotiation::check_cancel(&appointment, user_id)?;

        match self
            .appointments
            .cancel(id, user_id, request.reason.trim())
            .await?
        {
            Some(entity) => {
                let appointment: Appointment = entity.into();
                info!(
                    appointment_id = %appointment.id,
                    cancelled_by = %user_id,
                    "appointment cancelled"
                );
                dispatch_transition(&self.notifier, &appointment);
                Ok(appointment)
            }
            None => Err(self
                .classify_miss(id, |current| negotiation::check_cancel(current, user_id))
                .await),
        }
    }

    /// GPS-gated presence confirmation. On the second side's check-in the
    /// same write promotes the appointment to on_going.
    pub async fn check_in(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: CheckInRequest,
    ) -> Result<Appointment, EngineError> {
        request.validate()?;

        let appointment = self.require(id).await?;
        negotiation::check_check_in(&appointment, user_id)?;
        let side = match appointment.side_of(user_id) {
            Some(side) => side,
            None => return Err(TransitionDenied::NotParticipant.into()),
        };

        let location = self.require_location(appointment.location_id).await?;
        let distance_meters = shared::geo::distance_meters(
            request.latitude,
            request.longitude,
            location.latitude,
            location.longitude,
        );
        if distance_meters > self.config.check_in_radius_meters {
            return Err(EngineError::OutOfRange {
                distance_meters,
                radius_meters: self.config.check_in_radius_meters,
            });
        }

        match self.appointments.check_in(id, side).await? {
            Some(entity) => {
                let appointment: Appointment = entity.into();
                info!(
                    appointment_id = %appointment.id,
                    side = ?side,
                    distance_meters = distance_meters.round(),
                    "participant checked in"
                );
                if appointment.status == AppointmentStatus::OnGoing {
                    // This write promoted the meetup; tell both parties.
                    dispatch_transition(&self.notifier, &appointment);
                }
                Ok(appointment)
            }
            None => Err(self
                .classify_miss(id, |current| negotiation::check_check_in(current, user_id))
                .await),
        }
    }

    /// Manually finish an on-going meetup.
    pub async fn complete(&self, id: Uuid, user_id: Uuid) -> Result<Appointment, EngineError> {
        let appointment = self.require(id).await?;
        negotiation::check_complete(&appointment, user_id)?;

        match self.appointments.mark_completed(id).await? {
            Some(entity) => {
                let appointment: Appointment = entity.into();
                info!(
                    appointment_id = %appointment.id,
                    completed_by = %user_id,
                    "appointment completed"
                );
                dispatch_transition(&self.notifier, &appointment);
                Ok(appointment)
            }
            None => Err(self
                .classify_miss(id, |current| negotiation::check_complete(current, user_id))
                .await),
        }
    }

    /// One expiry sweep pass; normally driven by the background job.
    pub async fn run_expiry_sweep(&self) -> Result<SweepOutcome, EngineError> {
        Ok(self.sweeper.run_once().await?)
    }

    /// Whether a candidate meeting time collides with the user's other
    /// active appointments. Advisory only.
    pub async fn has_conflict(
        &self,
        user_id: Uuid,
        candidate_start: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        Ok(self
            .conflicts
            .has_conflict(user_id, candidate_start, None)
            .await?)
    }

    async fn require(&self, id: Uuid) -> Result<Appointment, EngineError> {
        self.appointments
            .find_by_id(id)
            .await?
            .map(Appointment::from)
            .ok_or_else(|| EngineError::NotFound(format!("appointment {id} not found")))
    }

    async fn require_location(&self, id: Uuid) -> Result<MeetupLocation, EngineError> {
        self.locations
            .find_by_id(id)
            .await?
            .map(MeetupLocation::from)
            .ok_or_else(|| EngineError::NotFound(format!("meetup location {id} not found")))
    }

    async fn resolve_location(
        &self,
        location_id: Option<Uuid>,
        custom_location: Option<&CustomLocationRequest>,
    ) -> Result<Uuid, EngineError> {
        match (location_id, custom_location) {
            (Some(_), Some(_)) => Err(EngineError::Validation(
                "supply either location_id or custom_location, not both".into(),
            )),
            (None, None) => Err(EngineError::Validation(
                "a meetup location is required".into(),
            )),
            (Some(id), None) => {
                self.require_location(id).await?;
                Ok(id)
            }
            (None, Some(custom)) => self.create_location(custom).await,
        }
    }

    async fn create_location(&self, custom: &CustomLocationRequest) -> Result<Uuid, EngineError> {
        let entity = self
            .locations
            .create(
                custom.name.trim(),
                custom.address.trim(),
                custom.latitude,
                custom.longitude,
                &[],
            )
            .await?;
        Ok(entity.id)
    }

    /// A conditional write matched no row. Re-read and report the most
    /// precise error: the guard's verdict against the fresh snapshot, or
    /// `StaleState` when the guard would still pass (the row changed in a
    /// way the guard cannot see, e.g. a bumped counter-offer count).
    async fn classify_miss<F>(&self, id: Uuid, guard: F) -> EngineError
    where
        F: Fn(&Appointment) -> Result<(), TransitionDenied>,
    {
        match self.appointments.find_by_id(id).await {
            Ok(Some(entity)) => {
                let current: Appointment = entity.into();
                match guard(&current) {
                    Err(denied) => denied.into(),
                    Ok(()) => EngineError::StaleState,
                }
            }
            Ok(None) => EngineError::NotFound(format!("appointment {id} not found")),
            Err(e) => EngineError::Database(e),
        }
    }
}
