pub mod anchor;
pub mod rpc_anchor;
pub mod scale;

pub use anchor::*;
pub use rpc_anchor::*;
pub use scale::*;

#[cfg(any(test, feature = "testing"))]
pub use anchor::MockLedgerAnchor;
