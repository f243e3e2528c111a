pub mod domain;
pub mod nats;
