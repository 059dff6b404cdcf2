//! Watch state management
//!
//! Tracks what a watcher last forwarded and decides, tick by tick, whether a
//! new outcome should be forwarded under the configured [`EmitPolicy`].

use crate::config::EmitPolicy;
use crate::domain::occlusion::OcclusionOutcome;

/// What the watcher has forwarded so far
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EmitState {
    /// Nothing forwarded yet
    #[default]
    Fresh,
    /// At least one outcome forwarded
    Emitted {
        /// Coverage of the last forwarded outcome
        last_coverage: f64,
    },
}

impl EmitState {
    pub fn new() -> Self {
        Self::Fresh
    }

    /// Coverage of the last forwarded outcome
    pub fn last_coverage(&self) -> Option<f64> {
        match self {
            EmitState::Fresh => None,
            EmitState::Emitted { last_coverage } => Some(*last_coverage),
        }
    }

    /// Returns true if `coverage` should be forwarded after this state
    pub fn should_emit(&self, policy: EmitPolicy, coverage: f64) -> bool {
        let EmitState::Emitted { last_coverage } = *self else {
            return true;
        };

        match policy.sanitized() {
            EmitPolicy::Always => true,
            #[allow(clippy::float_cmp)]
            EmitPolicy::OnChange => coverage != last_coverage,
            EmitPolicy::OnChangeBeyond(tolerance) => (coverage - last_coverage).abs() > tolerance,
            EmitPolicy::OnThresholdCrossing(threshold) => {
                (coverage > threshold) != (last_coverage > threshold)
            }
        }
    }

    /// Feeds one outcome through the policy
    ///
    /// Returns the next state and whether the outcome should be forwarded.
    /// The state only advances when the outcome is forwarded, so a slow
    /// drift under `OnChangeBeyond` is still reported once it adds up.
    pub fn advance(self, policy: EmitPolicy, outcome: &OcclusionOutcome) -> (EmitState, bool) {
        if self.should_emit(policy, outcome.coverage) {
            (
                EmitState::Emitted {
                    last_coverage: outcome.coverage,
                },
                true,
            )
        } else {
            (self, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::Rect;
    use crate::domain::surface::SurfaceDescriptor;

    fn outcome(coverage: f64) -> OcclusionOutcome {
        OcclusionOutcome {
            target: SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 10.0, 10.0)),
            coverage,
            occluders: Vec::new(),
            visible_rects: Vec::new(),
        }
    }

    fn run(policy: EmitPolicy, coverages: &[f64]) -> Vec<f64> {
        let mut state = EmitState::new();
        let mut emitted = Vec::new();
        for &coverage in coverages {
            let (next, emit) = state.advance(policy, &outcome(coverage));
            state = next;
            if emit {
                emitted.push(coverage);
            }
        }
        emitted
    }

    #[test]
    fn default_state_is_fresh() {
        let state = EmitState::default();
        assert_eq!(state, EmitState::Fresh);
        assert_eq!(state.last_coverage(), None);
    }

    #[test]
    fn first_outcome_always_emitted() {
        for policy in [
            EmitPolicy::Always,
            EmitPolicy::OnChange,
            EmitPolicy::OnChangeBeyond(0.5),
            EmitPolicy::OnThresholdCrossing(0.5),
        ] {
            assert_eq!(run(policy, &[0.0]), vec![0.0]);
        }
    }

    #[test]
    fn always_emits_every_tick() {
        assert_eq!(run(EmitPolicy::Always, &[0.1, 0.1, 0.1]), vec![0.1, 0.1, 0.1]);
    }

    #[test]
    fn on_change_uses_exact_equality() {
        let tiny = 0.25 + f64::EPSILON;
        assert_eq!(
            run(EmitPolicy::OnChange, &[0.25, 0.25, tiny, tiny, 0.25]),
            vec![0.25, tiny, 0.25]
        );
    }

    #[test]
    fn on_change_beyond_accumulates_drift() {
        assert_eq!(
            run(EmitPolicy::OnChangeBeyond(0.1), &[0.0, 0.05, 0.09, 0.11, 0.15]),
            vec![0.0, 0.11]
        );
    }

    #[test]
    fn threshold_crossing() {
        assert_eq!(
            run(EmitPolicy::OnThresholdCrossing(0.5), &[0.1, 0.4, 0.6, 0.9, 0.5, 0.2]),
            vec![0.1, 0.6, 0.5]
        );
    }

    #[test]
    fn nan_tolerance_still_reports_changes() {
        assert_eq!(
            run(EmitPolicy::OnChangeBeyond(f64::NAN), &[0.0, 0.0, 0.5, 0.5, 0.25]),
            vec![0.0, 0.5, 0.25]
        );
    }

    #[test]
    fn nan_threshold_still_reports_changes() {
        assert_eq!(
            run(EmitPolicy::OnThresholdCrossing(f64::NAN), &[0.1, 0.1, 0.9]),
            vec![0.1, 0.9]
        );
    }

    #[test]
    fn last_coverage_tracks_emitted_value() {
        let (state, _) = EmitState::new().advance(EmitPolicy::OnChange, &outcome(0.75));
        assert_eq!(state.last_coverage(), Some(0.75));
    }
}
