pub mod logger;

// Re-export logger initialization for convenience
pub use logger::LOG_LEVELS;
pub use logger::TelemetryError;
pub use logger::init;
pub use logger::validate_level;
