//! Cross-source identity resolution and trust scoring for charter operators and aircraft.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
