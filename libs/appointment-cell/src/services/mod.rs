pub mod booking;
pub mod lifecycle;
pub mod schedule;

pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycle;
pub use schedule::ScheduleService;
