// Application layer - Use cases and contracts to the telemetry server
pub mod error;
pub mod history_cache;
pub mod session_controller;
pub mod telemetry_api;
