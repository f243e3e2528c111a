mod telemetry_processor;

pub use telemetry_processor::create_telemetry_processor;
