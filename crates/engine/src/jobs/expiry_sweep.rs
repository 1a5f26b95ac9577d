//! The periodic expiry sweep job.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use domain::services::notification::AppointmentNotifier;

use super::scheduler::{Job, JobFrequency};
use crate::config::SchedulingConfig;
use crate::engine::ExpirySweeper;

/// Background job that forces terminal transitions on stale appointments.
pub struct ExpirySweepJob {
    sweeper: ExpirySweeper,
    interval_minutes: u64,
}

impl ExpirySweepJob {
    pub fn new(
        pool: PgPool,
        notifier: Arc<dyn AppointmentNotifier>,
        config: &SchedulingConfig,
    ) -> Self {
        Self {
            sweeper: ExpirySweeper::new(pool, notifier, config.grace_period_minutes),
            interval_minutes: config.sweep_interval_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpirySweepJob {
    fn name(&self) -> &'static str {
        "expiry_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.interval_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let outcome = self
            .sweeper
            .run_once()
            .await
            .map_err(|e| format!("expiry sweep pass failed: {e}"))?;

        if outcome.no_shows > 0 || outcome.auto_completed > 0 || outcome.skipped > 0 {
            info!(
                no_shows = outcome.no_shows,
                auto_completed = outcome.auto_completed,
                skipped = outcome.skipped,
                "expiry sweep pass finished"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_interval_follows_config() {
        let config = SchedulingConfig::default();
        // The job cannot be built without a pool; assert on the frequency math
        let freq = JobFrequency::Minutes(config.sweep_interval_minutes);
        assert_eq!(freq.duration().as_secs(), 300);
    }
}
