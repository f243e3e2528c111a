pub mod fanout;
pub mod http_sender;

pub use fanout::*;
pub use http_sender::*;

#[cfg(any(test, feature = "testing"))]
pub use fanout::{MockAlertNotifier, MockPushSender};
