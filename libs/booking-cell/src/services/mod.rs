pub mod booking;
pub mod lifecycle;
pub mod locks;

pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use locks::SlotLockRegistry;
