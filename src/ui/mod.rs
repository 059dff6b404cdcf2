pub mod renderer;

pub use renderer::{raster_coverage, OcclusionLayout, OcclusionRenderer, RendererError};
