//! Repository implementations.

mod appointment;
mod location;

pub use appointment::AppointmentRepository;
pub use location::LocationRepository;
