//! Notification contract for appointment state transitions.
//!
//! Delivery is owned by an adjacent push/real-time service. The engine fires
//! one notification per committed state transition, best-effort: a delivery
//! failure is logged and never rolls the transition back.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AppointmentStatus;

/// Payload describing a committed appointment state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionNotification {
    pub appointment_id: Uuid,
    pub status: AppointmentStatus,
    /// Both participants; the dispatcher decides who actually gets pinged.
    pub recipients: Vec<Uuid>,
    pub occurred_at: DateTime<Utc>,
}

/// Result of a notification dispatch attempt.
#[derive(Debug, Clone)]
pub enum NotificationResult {
    /// Handed to the dispatcher successfully.
    Sent,
    /// Dispatch failed (non-blocking).
    Failed(String),
}

/// Dispatcher contract for appointment transition notifications.
#[async_trait::async_trait]
pub trait AppointmentNotifier: Send + Sync {
    async fn notify_transition(&self, notification: TransitionNotification) -> NotificationResult;
}

/// Notifier for development deployments: logs transitions without sending.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
}

impl LoggingNotifier {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    /// A notifier that fails every dispatch.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl AppointmentNotifier for LoggingNotifier {
    async fn notify_transition(&self, notification: TransitionNotification) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                appointment_id = %notification.appointment_id,
                status = %notification.status,
                "notifier simulating failure"
            );
            return NotificationResult::Failed("simulated failure".to_string());
        }

        tracing::info!(
            appointment_id = %notification.appointment_id,
            status = %notification.status,
            recipients = notification.recipients.len(),
            "would dispatch transition notification"
        );
        NotificationResult::Sent
    }
}

/// Notifier that records payloads for test assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<TransitionNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<TransitionNotification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl AppointmentNotifier for RecordingNotifier {
    async fn notify_transition(&self, notification: TransitionNotification) -> NotificationResult {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
        NotificationResult::Sent
    }
}
