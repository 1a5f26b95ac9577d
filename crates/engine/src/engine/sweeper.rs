//! The expiry sweep: forces terminal transitions on stale appointments.
//!
//! A sweep pass selects candidates first and then applies one conditional
//! write per row. Losing a race against a user-initiated transition (or a
//! previous sweep) just skips the row; a per-row failure is logged and the
//! pass continues. Re-running a pass is therefore always safe.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};

use domain::models::Appointment;
use domain::services::notification::AppointmentNotifier;
use persistence::repositories::AppointmentRepository;

use super::dispatch_transition;

/// Row counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Confirmed meetups nobody (or only one side) showed up for.
    pub no_shows: u64,
    /// On-going meetups finished on the participants' behalf.
    pub auto_completed: u64,
    /// Candidates that transitioned concurrently or failed; retried next tick.
    pub skipped: u64,
}

/// Periodic background worker converting stale states into terminal ones.
#[derive(Clone)]
pub struct ExpirySweeper {
    appointments: AppointmentRepository,
    notifier: Arc<dyn AppointmentNotifier>,
    grace_period: Duration,
}

impl ExpirySweeper {
    pub fn new(
        pool: PgPool,
        notifier: Arc<dyn AppointmentNotifier>,
        grace_period_minutes: i64,
    ) -> Self {
        Self {
            appointments: AppointmentRepository::new(pool),
            notifier,
            grace_period: Duration::minutes(grace_period_minutes),
        }
    }

    /// One sweep pass over all stale appointments.
    pub async fn run_once(&self) -> Result<SweepOutcome, sqlx::Error> {
        let cutoff = Utc::now() - self.grace_period;
        let mut outcome = SweepOutcome::default();

        for candidate in self.appointments.list_confirmed_overdue(cutoff).await? {
            match self.appointments.mark_no_show(candidate.id).await {
                Ok(Some(row)) => {
                    outcome.no_shows += 1;
                    metrics::counter!("appointments_no_show_total").increment(1);
                    let appointment: Appointment = row.into();
                    info!(
                        appointment_id = %appointment.id,
                        scheduled_at = %appointment.scheduled_at,
                        "swept confirmed appointment to no_show"
                    );
                    dispatch_transition(&self.notifier, &appointment);
                }
                Ok(None) => {
                    outcome.skipped += 1;
                    debug!(appointment_id = %candidate.id, "no_show sweep lost the race, skipping");
                }
                Err(e) => {
                    outcome.skipped += 1;
                    warn!(appointment_id = %candidate.id, error = %e, "no_show sweep failed for row, continuing");
                }
            }
        }

        for candidate in self.appointments.list_on_going_overdue(cutoff).await? {
            match self.appointments.mark_completed(candidate.id).await {
                Ok(Some(row)) => {
                    outcome.auto_completed += 1;
                    metrics::counter!("appointments_auto_completed_total").increment(1);
                    let appointment: Appointment = row.into();
                    info!(
                        appointment_id = %appointment.id,
                        "auto-completed on-going appointment"
                    );
                    dispatch_transition(&self.notifier, &appointment);
                }
                Ok(None) => {
                    outcome.skipped += 1;
                    debug!(appointment_id = %candidate.id, "auto-complete sweep lost the race, skipping");
                }
                Err(e) => {
                    outcome.skipped += 1;
                    warn!(appointment_id = %candidate.id, error = %e, "auto-complete sweep failed for row, continuing");
                }
            }
        }

        Ok(outcome)
    }
}
