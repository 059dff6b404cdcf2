use std::time::Duration;

use crate::config::ConfigError;

/// When a watcher forwards a freshly calculated outcome
///
/// The first outcome of a watch is always forwarded, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EmitPolicy {
    /// Every tick
    Always,
    /// Only when coverage differs from the last forwarded value
    ///
    /// Coverage is compared with exact floating-point equality. Identical
    /// layouts reproduce bit-identical coverage, so this filters repeated
    /// ticks without hiding real movement.
    #[default]
    OnChange,
    /// Only when coverage moved by more than the given tolerance
    ///
    /// Build with [`EmitPolicy::on_change_beyond`] to reject bad values up
    /// front. A NaN or negative tolerance is applied as [`EmitPolicy::OnChange`].
    OnChangeBeyond(f64),
    /// Only when `coverage > threshold` flips
    ///
    /// Build with [`EmitPolicy::on_threshold_crossing`] to reject bad values
    /// up front. Thresholds outside [0, 1] are clamped; NaN is applied as
    /// [`EmitPolicy::OnChange`].
    OnThresholdCrossing(f64),
}

impl EmitPolicy {
    /// Tolerance-based change detection
    pub fn on_change_beyond(tolerance: f64) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance { value: tolerance });
        }
        Ok(EmitPolicy::OnChangeBeyond(tolerance))
    }

    /// Emit when the target becomes occluded or stops being occluded
    pub fn on_threshold_crossing(threshold: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }
        Ok(EmitPolicy::OnThresholdCrossing(threshold))
    }

    /// Policy with out-of-range parameters replaced by usable ones
    pub fn sanitized(self) -> Self {
        match self {
            EmitPolicy::OnChangeBeyond(tolerance) if tolerance.is_nan() || tolerance < 0.0 => {
                EmitPolicy::OnChange
            }
            EmitPolicy::OnThresholdCrossing(threshold) if threshold.is_nan() => {
                EmitPolicy::OnChange
            }
            EmitPolicy::OnThresholdCrossing(threshold) => {
                EmitPolicy::OnThresholdCrossing(threshold.clamp(0.0, 1.0))
            }
            policy => policy,
        }
    }
}

/// Settings for a polling watch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchConfig {
    /// Delay between the end of one tick and the start of the next
    pub interval: Duration,
    /// Which outcomes are forwarded
    pub policy: EmitPolicy,
}

impl WatchConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(interval: Duration, policy: EmitPolicy) -> Self {
        Self { interval, policy }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_policy(mut self, policy: EmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sanitize_interval(interval: Duration) -> Duration {
        interval.clamp(Self::MIN_INTERVAL, Self::MAX_INTERVAL)
    }

    /// Copy of the config with the interval clamped to the supported range
    /// and the policy parameters sanitized
    pub fn sanitized(&self) -> Self {
        Self {
            interval: Self::sanitize_interval(self.interval),
            policy: self.policy.sanitized(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, EmitPolicy::default())
    }
}
