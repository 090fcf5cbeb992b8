pub mod device;
pub mod log_entry;
pub mod sensor;
pub mod user;

pub use device::Device;
pub use log_entry::LogEntry;
pub use sensor::SensorReading;
pub use user::User;
