//! Configuration objects for the occlusion engine
//!
//! Settings are plain values constructed by the caller and handed to the
//! calculator or watcher that needs them. There is no process-wide shared
//! configuration.

pub mod calculator;
pub mod watch;

use thiserror::Error;

pub use calculator::CalculatorConfig;
pub use watch::{EmitPolicy, WatchConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Opacity cutoff {value} is outside [0, 1)")]
    OpacityCutoffOutOfRange { value: f64 },
    #[error("Threshold {value} must be a finite value in [0, 1]")]
    InvalidThreshold { value: f64 },
    #[error("Change tolerance {value} must be finite and non-negative")]
    InvalidTolerance { value: f64 },
}
