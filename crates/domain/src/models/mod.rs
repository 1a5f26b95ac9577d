//! Domain models and DTOs.

pub mod appointment;
pub mod location;

pub use appointment::{
    ActivityType, Appointment, AppointmentStatus, AppointmentWithConflict,
    CancelAppointmentRequest, CheckInRequest, CounterOfferRequest, CreateAppointmentRequest,
    CustomLocationRequest, ParticipantSide, RespondRequest,
};
pub use location::MeetupLocation;
