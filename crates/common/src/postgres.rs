mod client;
mod push_subscription_repository;
mod sensor_record_repository;
mod threshold_repository;

pub use client::*;
pub use push_subscription_repository::*;
pub use sensor_record_repository::*;
pub use threshold_repository::*;
