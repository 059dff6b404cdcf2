//! Window-Occlusion: exact visibility of on-screen windows
//!
//! Computes how much of a window is hidden by the windows stacked in front of
//! it. The visible remainder is tracked as a set of disjoint rectangles, so
//! overlapping occluders are never counted twice.
//!
//! - `domain`: geometry, regions, surfaces, the occlusion calculator, queries
//! - `platform`: surface providers (in-memory snapshot, Win32)
//! - `config`: calculator and watch settings
//! - `app`: periodic watching with change detection
//! - `ui`: occlusion map rendering

pub mod app;
pub mod config;
pub mod domain;
pub mod platform;
pub mod ui;

pub use config::{CalculatorConfig, ConfigError, EmitPolicy, WatchConfig};
pub use domain::core::Rect;
pub use domain::occlusion::{OcclusionCalculator, OcclusionError, OcclusionOutcome};
pub use domain::query::SurfaceQuery;
pub use domain::region::Region;
pub use domain::surface::{ProcessId, SurfaceDescriptor, SurfaceId};
pub use platform::{ProviderError, SnapshotProvider, SurfaceProvider};
