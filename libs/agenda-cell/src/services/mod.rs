pub mod resolver;
pub mod schedule;
pub mod timewindow;
pub mod windows;

pub use resolver::AvailabilityResolver;
pub use schedule::ScheduleService;
pub use timewindow::TimeInterval;
pub use windows::WindowService;
