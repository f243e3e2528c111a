pub mod hub;
pub mod server;
pub mod ws;

pub use hub::*;
pub use server::*;

#[cfg(any(test, feature = "testing"))]
pub use hub::MockBroadcastHub;
