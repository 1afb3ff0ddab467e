pub mod dispatch;
pub mod schedules;
pub mod system;
pub mod tas;

pub use dispatch::DispatchService;
pub use schedules::ScheduleService;
pub use system::SystemService;
pub use tas::TaService;
