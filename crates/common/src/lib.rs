pub mod domain;
pub mod nats;
pub mod postgres;
pub mod telemetry;

pub use domain::*;
pub use nats::*;
pub use postgres::*;
pub use telemetry::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockPushSubscriptionRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockSensorRecordRepository;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockThresholdRepository;
