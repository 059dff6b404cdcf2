//! Occlusion calculation
//!
//! Given surfaces ordered front to back and a target surface, this module
//! works out how much of the target is hidden by eligible surfaces stacked
//! in front of it. The remaining visible area is tracked as a [`Region`], so
//! overlapping occluders are never counted twice.
//!
//! The pure entry point is [`compute_occlusion`], which works on a snapshot
//! slice. [`OcclusionCalculator`] wraps it with a [`SurfaceProvider`] and
//! fetches one fresh snapshot per call.

use log::{debug, trace};
use thiserror::Error;

use crate::config::CalculatorConfig;
use crate::domain::core::Rect;
use crate::domain::query::SurfaceQuery;
use crate::domain::region::Region;
use crate::domain::surface::{SurfaceDescriptor, SurfaceId};
use crate::platform::{ProviderError, SurfaceProvider};

/// Errors returned by occlusion calculations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcclusionError {
    /// The requested surface is not in the current snapshot
    #[error("Surface {id} not found")]
    TargetNotFound { id: SurfaceId },

    /// The surface provider failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Result of analysing one target surface
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionOutcome {
    /// The analysed surface
    pub target: SurfaceDescriptor,
    /// Fraction of the target hidden by occluders, in [0, 1]
    pub coverage: f64,
    /// Surfaces that hide part of the target, front to back
    pub occluders: Vec<SurfaceDescriptor>,
    /// Disjoint rectangles of the target that remain visible
    pub visible_rects: Vec<Rect>,
}

impl OcclusionOutcome {
    /// Fraction of the target still visible
    pub fn visible_percentage(&self) -> f64 {
        1.0 - self.coverage
    }

    /// Returns true if more than `threshold` of the target is hidden
    pub fn is_occluded(&self, threshold: f64) -> bool {
        self.coverage > threshold
    }

    /// Returns true if more than `threshold` of the target is visible
    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visible_percentage() > threshold
    }

    pub fn is_fully_visible(&self) -> bool {
        self.coverage == 0.0
    }

    pub fn is_fully_occluded(&self) -> bool {
        self.coverage >= 1.0
    }

    /// Sum of the visible rectangles' areas
    pub fn visible_area(&self) -> f64 {
        self.visible_rects.iter().map(Rect::area).sum()
    }

    /// Area of the target hidden by occluders
    pub fn occluded_area(&self) -> f64 {
        (self.target.area() - self.visible_area()).max(0.0)
    }

    pub fn occluder_count(&self) -> usize {
        self.occluders.len()
    }

    fn fully_hidden(target: SurfaceDescriptor) -> Self {
        Self {
            target,
            coverage: 1.0,
            occluders: Vec::new(),
            visible_rects: Vec::new(),
        }
    }
}

/// Returns true when `candidate` may hide part of `target`
///
/// Only on-screen surfaces on the target's own layer whose opacity passes
/// the configured cutoff take part.
pub fn is_eligible_occluder(
    candidate: &SurfaceDescriptor,
    target: &SurfaceDescriptor,
    config: &CalculatorConfig,
) -> bool {
    candidate.layer == target.layer && config.is_opaque(candidate.opacity) && candidate.is_on_screen
}

/// Computes the occlusion of `target_id` within one snapshot
///
/// `surfaces` must be ordered front to back. Every surface positioned before
/// the target counts as in front of it; the order is trusted as given.
///
/// # Example
/// ```rust
/// use window_occlusion::config::CalculatorConfig;
/// use window_occlusion::domain::core::Rect;
/// use window_occlusion::domain::occlusion::compute_occlusion;
/// use window_occlusion::domain::surface::{SurfaceDescriptor, SurfaceId};
///
/// let surfaces = vec![
///     SurfaceDescriptor::new(2, Rect::new(0.0, 0.0, 100.0, 100.0)),
///     SurfaceDescriptor::new(1, Rect::new(0.0, 0.0, 200.0, 200.0)),
/// ];
/// let outcome = compute_occlusion(&surfaces, SurfaceId(1), &CalculatorConfig::default()).unwrap();
/// assert_eq!(outcome.coverage, 0.25);
/// ```
pub fn compute_occlusion(
    surfaces: &[SurfaceDescriptor],
    target_id: SurfaceId,
    config: &CalculatorConfig,
) -> Result<OcclusionOutcome, OcclusionError> {
    let position = surfaces
        .iter()
        .position(|surface| surface.id == target_id)
        .ok_or(OcclusionError::TargetNotFound { id: target_id })?;

    Ok(occlusion_at(surfaces, position, config))
}

/// Computes the occlusion of the surface at `position` in `surfaces`
fn occlusion_at(
    surfaces: &[SurfaceDescriptor],
    position: usize,
    config: &CalculatorConfig,
) -> OcclusionOutcome {
    let target = &surfaces[position];
    let frame = target.frame;
    let target_area = frame.area();

    // Zero-area and unbounded targets count as not visible at all
    if target_area <= 0.0 || !frame.is_contributing() {
        debug!("Surface {} has no usable area, treating as fully covered", target.id);
        return OcclusionOutcome::fully_hidden(target.clone());
    }

    let mut visible = Region::from_rect(frame);
    let mut occluders = Vec::new();

    for candidate in &surfaces[..position] {
        if !is_eligible_occluder(candidate, target, config) {
            trace!(
                "Skipping surface {} (layer {}, opacity {}, on screen {})",
                candidate.id,
                candidate.layer,
                candidate.opacity,
                candidate.is_on_screen
            );
            continue;
        }

        if frame.intersects(&candidate.frame) {
            visible = visible.subtract(candidate.frame);
            occluders.push(candidate.clone());
        }
    }

    let coverage = (1.0 - visible.area() / target_area).clamp(0.0, 1.0);

    debug!(
        "Surface {} coverage {:.4} from {} occluders, {} visible pieces",
        target.id,
        coverage,
        occluders.len(),
        visible.len()
    );

    OcclusionOutcome {
        target: target.clone(),
        coverage,
        occluders,
        visible_rects: visible.into_rects(),
    }
}

/// Computes outcomes for every id present in the snapshot
///
/// Ids missing from `surfaces` are skipped without error.
pub fn compute_many(
    surfaces: &[SurfaceDescriptor],
    target_ids: &[SurfaceId],
    config: &CalculatorConfig,
) -> Vec<OcclusionOutcome> {
    target_ids
        .iter()
        .filter_map(|&id| compute_occlusion(surfaces, id, config).ok())
        .collect()
}

/// Computes a per-id result, reporting missing ids as `TargetNotFound`
pub fn compute_each(
    surfaces: &[SurfaceDescriptor],
    target_ids: &[SurfaceId],
    config: &CalculatorConfig,
) -> Vec<(SurfaceId, Result<OcclusionOutcome, OcclusionError>)> {
    target_ids
        .iter()
        .map(|&id| (id, compute_occlusion(surfaces, id, config)))
        .collect()
}

/// Computes outcomes for every surface the query selects, front to back
pub fn compute_matching(
    surfaces: &[SurfaceDescriptor],
    query: &SurfaceQuery,
    config: &CalculatorConfig,
) -> Vec<OcclusionOutcome> {
    surfaces
        .iter()
        .enumerate()
        .filter(|(_, surface)| query.matches(surface))
        .map(|(position, _)| occlusion_at(surfaces, position, config))
        .collect()
}

/// Occlusion calculator bound to a surface provider
///
/// Every call fetches a fresh snapshot from the provider; nothing is cached
/// between calls. The calculator holds no mutable state, so it can be shared
/// across threads whenever the provider can.
#[derive(Debug, Clone)]
pub struct OcclusionCalculator<P> {
    provider: P,
    config: CalculatorConfig,
}

impl<P: SurfaceProvider> OcclusionCalculator<P> {
    /// Creates a calculator with the default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, CalculatorConfig::default())
    }

    pub fn with_config(provider: P, config: CalculatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Analyses one surface
    pub fn calculate(&self, target_id: SurfaceId) -> Result<OcclusionOutcome, OcclusionError> {
        let surfaces = self.provider.all_surfaces()?;
        compute_occlusion(&surfaces, target_id, &self.config)
    }

    /// Analyses several surfaces against a single snapshot
    ///
    /// Ids that are not in the snapshot are dropped from the result. Use
    /// [`OcclusionCalculator::calculate_each`] to learn which ones.
    pub fn calculate_many(
        &self,
        target_ids: &[SurfaceId],
    ) -> Result<Vec<OcclusionOutcome>, OcclusionError> {
        let surfaces = self.provider.all_surfaces()?;
        Ok(compute_many(&surfaces, target_ids, &self.config))
    }

    /// Analyses several surfaces against a single snapshot, one result per id
    pub fn calculate_each(
        &self,
        target_ids: &[SurfaceId],
    ) -> Result<Vec<(SurfaceId, Result<OcclusionOutcome, OcclusionError>)>, OcclusionError> {
        let surfaces = self.provider.all_surfaces()?;
        Ok(compute_each(&surfaces, target_ids, &self.config))
    }

    /// Analyses every surface selected by `query` against a single snapshot
    pub fn calculate_matching(
        &self,
        query: &SurfaceQuery,
    ) -> Result<Vec<OcclusionOutcome>, OcclusionError> {
        let surfaces = self.provider.all_surfaces()?;
        Ok(compute_matching(&surfaces, query, &self.config))
    }

    /// Coverage ratio of one surface
    pub fn coverage(&self, target_id: SurfaceId) -> Result<f64, OcclusionError> {
        self.calculate(target_id).map(|outcome| outcome.coverage)
    }

    /// Returns true if more than `threshold` of the surface is hidden
    pub fn is_occluded(
        &self,
        target_id: SurfaceId,
        threshold: f64,
    ) -> Result<bool, OcclusionError> {
        self.calculate(target_id)
            .map(|outcome| outcome.is_occluded(threshold))
    }

    /// Returns true if more than `threshold` of the surface is visible
    pub fn is_visible(
        &self,
        target_id: SurfaceId,
        threshold: f64,
    ) -> Result<bool, OcclusionError> {
        self.calculate(target_id)
            .map(|outcome| outcome.is_visible(threshold))
    }
}
