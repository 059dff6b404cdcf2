//! Surface descriptors
//!
//! A surface is anything the platform stacks on screen: normally a top-level
//! window. Descriptors are snapshots produced by a surface provider and are
//! never mutated by the occlusion code.

use std::fmt;

use crate::domain::core::Rect;

/// Layer of normal application windows
pub const NORMAL_LAYER: i32 = 0;

/// Platform identifier of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SurfaceId {
    fn from(id: u64) -> Self {
        SurfaceId(id)
    }
}

/// Identifier of the process owning a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one on-screen surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDescriptor {
    /// Surface identifier
    pub id: SurfaceId,
    /// Owning process
    pub process_id: ProcessId,
    /// Name of the owning application, when the platform reports one
    pub owner_name: Option<String>,
    /// Human readable title, when available
    pub title: Option<String>,
    /// Frame in screen coordinates
    pub frame: Rect,
    /// Stacking layer; 0 for normal windows, non-zero for system chrome
    pub layer: i32,
    /// Opacity in [0, 1]
    pub opacity: f64,
    /// Whether the surface is currently shown
    pub is_on_screen: bool,
    /// Front-to-back rank, 0 is frontmost
    pub z_index: usize,
}

impl SurfaceDescriptor {
    /// Creates an opaque, on-screen, normal-layer surface
    ///
    /// Other attributes can be adjusted with the `with_*` methods.
    pub fn new(id: impl Into<SurfaceId>, frame: Rect) -> Self {
        Self {
            id: id.into(),
            process_id: ProcessId(0),
            owner_name: None,
            title: None,
            frame,
            layer: NORMAL_LAYER,
            opacity: 1.0,
            is_on_screen: true,
            z_index: 0,
        }
    }

    pub fn with_process(mut self, process_id: ProcessId) -> Self {
        self.process_id = process_id;
        self
    }

    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the opacity, clamped to [0, 1]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
        self
    }

    pub fn with_on_screen(mut self, is_on_screen: bool) -> Self {
        self.is_on_screen = is_on_screen;
        self
    }

    pub fn with_z_index(mut self, z_index: usize) -> Self {
        self.z_index = z_index;
        self
    }

    /// Area of the frame
    pub fn area(&self) -> f64 {
        self.frame.area()
    }

    /// Returns true for surfaces on the normal application layer
    pub fn is_normal_layer(&self) -> bool {
        self.layer == NORMAL_LAYER
    }

    /// Title if present, otherwise the owner name, otherwise a placeholder
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .or(self.owner_name.as_deref())
            .unwrap_or("<untitled>")
    }
}

/// Re-numbers `z_index` so it matches each descriptor's position
pub fn assign_z_order(surfaces: &mut [SurfaceDescriptor]) {
    for (index, surface) in surfaces.iter_mut().enumerate() {
        surface.z_index = index;
    }
}
