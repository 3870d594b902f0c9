pub mod booking;
pub mod service;
pub mod slot;

pub use booking::{Booking, BookingStatus};
pub use service::Service;
pub use slot::{generate_slots, AppointmentWindow, BusyInterval, TimeSlot};
