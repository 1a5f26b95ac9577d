//! Entity definitions (database row mappings).

mod appointment;
mod location;

pub use appointment::{AppointmentEntity, AppointmentStatusDb};
pub use location::MeetupLocationEntity;
