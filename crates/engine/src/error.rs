//! The engine's caller-facing error taxonomy.
//!
//! Everything except `Database` is an expected, recoverable condition: the
//! caller gets a stable machine-readable kind plus a human-readable message
//! and can decide whether to correct the request or retry. `StaleState` in
//! particular means a concurrent transition won; clients should re-fetch and
//! retry where that still makes sense.

use thiserror::Error;

use domain::services::negotiation::TransitionDenied;
use domain::services::preconditions::PreconditionFailed;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid precondition: {0}")]
    InvalidPrecondition(String),

    #[error("Not your turn: {0}")]
    NotYourTurn(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Counter-offer limit of {limit} reached; accept or decline instead")]
    CounterOfferLimitReached { limit: i32 },

    #[error("Out of range: {distance_meters:.0} m from the meetup location (allowed {radius_meters:.0} m)")]
    OutOfRange {
        distance_meters: f64,
        radius_meters: f64,
    },

    #[error("Stale state: the appointment changed concurrently; re-fetch and retry")]
    StaleState,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// Stable machine-readable error code for transport layers to map.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidPrecondition(_) => "invalid_precondition",
            EngineError::NotYourTurn(_) => "not_your_turn",
            EngineError::InvalidState(_) => "invalid_state",
            EngineError::CounterOfferLimitReached { .. } => "counter_offer_limit_reached",
            EngineError::OutOfRange { .. } => "out_of_range",
            EngineError::StaleState => "stale_state",
            EngineError::NotFound(_) => "not_found",
            EngineError::Validation(_) => "validation_error",
            EngineError::Database(_) => "database_error",
        }
    }

    /// Whether an immediate re-fetch-and-retry can resolve the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StaleState)
    }
}

impl From<TransitionDenied> for EngineError {
    fn from(denied: TransitionDenied) -> Self {
        match denied {
            TransitionDenied::NotParticipant | TransitionDenied::NotYourTurn => {
                EngineError::NotYourTurn(denied.to_string())
            }
            TransitionDenied::InvalidState { .. } => EngineError::InvalidState(denied.to_string()),
            TransitionDenied::CounterOfferLimitReached { limit } => {
                EngineError::CounterOfferLimitReached { limit }
            }
        }
    }
}

impl From<PreconditionFailed> for EngineError {
    fn from(failed: PreconditionFailed) -> Self {
        EngineError::InvalidPrecondition(failed.0)
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{field}: {message}")
                })
            })
            .collect();
        EngineError::Validation(details.join(", "))
    }
}

impl From<validator::ValidationError> for EngineError {
    fn from(error: validator::ValidationError) -> Self {
        let message = error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| error.code.to_string());
        EngineError::Validation(message)
    }
}
