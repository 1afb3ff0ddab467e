pub mod schedules;

pub mod system;

pub mod tas;

pub use schedules::configure_schedules_routes;
pub use system::configure_system_routes;
pub use tas::configure_tas_routes;
