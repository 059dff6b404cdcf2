use crate::config::ConfigError;

/// Rules deciding which surfaces may occlude a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorConfig {
    /// A surface occludes only when its opacity is strictly above this value
    pub opacity_cutoff: f64,
}

impl CalculatorConfig {
    pub const DEFAULT_OPACITY_CUTOFF: f64 = 0.0;

    pub fn new() -> Self {
        Self {
            opacity_cutoff: Self::DEFAULT_OPACITY_CUTOFF,
        }
    }

    /// Returns a config with the given opacity cutoff
    ///
    /// A cutoff of 1.0 or more would make every surface transparent, so it
    /// is rejected along with negative and NaN values.
    pub fn with_opacity_cutoff(self, opacity_cutoff: f64) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&opacity_cutoff) {
            return Err(ConfigError::OpacityCutoffOutOfRange {
                value: opacity_cutoff,
            });
        }
        Ok(Self { opacity_cutoff })
    }

    /// Returns true when `opacity` is high enough to block what is behind
    pub fn is_opaque(&self, opacity: f64) -> bool {
        opacity > self.opacity_cutoff
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
