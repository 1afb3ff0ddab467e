pub use super::schedules::Entity as Schedules;
pub use super::tas::Entity as Tas;
