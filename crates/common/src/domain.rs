mod events;
mod push;
mod reading;
mod result;
mod threshold;

pub use events::*;
pub use push::*;
pub use reading::*;
pub use result::*;
pub use threshold::*;
