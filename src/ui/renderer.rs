//! Occlusion map rendering
//!
//! Draws an [`OcclusionOutcome`] into a tiny-skia pixmap: hidden area in one
//! colour, visible pieces in another, occluder outlines optionally on top.
//! Layout calculation is kept apart from rendering so it can be tested
//! without touching pixels.

use std::path::Path;

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, Transform};

use crate::domain::core::Rect;
use crate::domain::occlusion::OcclusionOutcome;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidCanvasDimensions { width: f64, height: f64 },

    #[error("Failed to encode PNG: {0}")]
    EncodingFailed(String),
}

/// Colour of hidden target area
pub const COVERED_RGBA: [u8; 4] = [200, 40, 40, 255];
/// Colour of visible target area
pub const VISIBLE_RGBA: [u8; 4] = [40, 180, 80, 255];
/// Colour of occluder outlines
pub const OUTLINE_RGBA: [u8; 4] = [255, 255, 255, 255];

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

/// Filled or outlined rectangle in canvas pixels
#[derive(Debug, Clone)]
pub struct LayoutRect {
    pub rect: SkiaRect,
    pub color: Color,
}

/// Pre-calculated geometry for one occlusion map
///
/// All rectangles are relative to the target's top-left corner and scaled.
#[derive(Debug, Clone)]
pub struct OcclusionLayout {
    /// Visible pieces of the target
    pub visible: Vec<LayoutRect>,

    /// Parts of each occluder that overlap the target
    pub outlines: Vec<LayoutRect>,

    /// Canvas dimensions in pixels
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Stroke width for outlines
    pub outline_width: f32,

    /// Whether occluder outlines are drawn
    pub show_occluders: bool,
}

impl OcclusionLayout {
    /// Create a layout from an outcome
    ///
    /// `scale` maps screen units to canvas pixels.
    pub fn from_outcome(
        outcome: &OcclusionOutcome,
        scale: f64,
        show_occluders: bool,
    ) -> Result<Self, RendererError> {
        let frame = outcome.target.frame;
        let width = (frame.w * scale).ceil();
        let height = (frame.h * scale).ceil();

        let max = u32::MAX as f64;
        if !frame.is_contributing()
            || !(1.0..=max).contains(&width)
            || !(1.0..=max).contains(&height)
        {
            return Err(RendererError::InvalidCanvasDimensions { width, height });
        }

        let to_canvas = |rect: &Rect| {
            SkiaRect::from_xywh(
                ((rect.x - frame.x) * scale) as f32,
                ((rect.y - frame.y) * scale) as f32,
                (rect.w * scale) as f32,
                (rect.h * scale) as f32,
            )
        };

        let visible = outcome
            .visible_rects
            .iter()
            .filter_map(|rect| to_canvas(rect))
            .map(|rect| LayoutRect {
                rect,
                color: color(VISIBLE_RGBA),
            })
            .collect();

        let outlines = if show_occluders {
            outcome
                .occluders
                .iter()
                .filter_map(|occluder| frame.intersection(&occluder.frame))
                .filter_map(|rect| to_canvas(&rect))
                .map(|rect| LayoutRect {
                    rect,
                    color: color(OUTLINE_RGBA),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            visible,
            outlines,
            canvas_width: width as u32,
            canvas_height: height as u32,
            outline_width: (2.0 * scale as f32).max(1.0),
            show_occluders,
        })
    }
}

/// Occlusion map renderer using tiny-skia
#[derive(Debug, Default)]
pub struct OcclusionRenderer;

impl OcclusionRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a layout to a pixmap
    pub fn render(&self, layout: &OcclusionLayout) -> Result<Pixmap, RendererError> {
        let mut pixmap = Pixmap::new(layout.canvas_width, layout.canvas_height)
            .ok_or(RendererError::PixmapCreationFailed)?;

        // Everything starts hidden; visible pieces are painted over it
        pixmap.fill(color(COVERED_RGBA));

        let mut paint = Paint::default();
        paint.anti_alias = false;

        for piece in &layout.visible {
            paint.set_color(piece.color);
            pixmap.fill_rect(piece.rect, &paint, Transform::identity(), None);
        }

        if layout.show_occluders {
            self.render_outlines(&mut pixmap, layout);
        }

        Ok(pixmap)
    }

    fn render_outlines(&self, pixmap: &mut Pixmap, layout: &OcclusionLayout) {
        let stroke = Stroke {
            width: layout.outline_width,
            ..Stroke::default()
        };

        for outline in &layout.outlines {
            let path = PathBuilder::from_rect(outline.rect);
            let mut paint = Paint::default();
            paint.set_color(outline.color);
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Render an outcome and write it as PNG
    pub fn save_png(
        &self,
        outcome: &OcclusionOutcome,
        scale: f64,
        path: impl AsRef<Path>,
    ) -> Result<(), RendererError> {
        let layout = OcclusionLayout::from_outcome(outcome, scale, true)?;
        let pixmap = self.render(&layout)?;
        pixmap
            .save_png(path)
            .map_err(|err| RendererError::EncodingFailed(err.to_string()))
    }
}

/// Fraction of pixels painted in the covered colour
///
/// For pixel-aligned layouts rendered without outlines this reproduces the
/// outcome's coverage, which makes it a useful independent check.
pub fn raster_coverage(pixmap: &Pixmap) -> f64 {
    let pixels = pixmap.pixels();
    if pixels.is_empty() {
        return 0.0;
    }

    let covered = pixels
        .iter()
        .filter(|p| [p.red(), p.green(), p.blue(), p.alpha()] == COVERED_RGBA)
        .count();

    covered as f64 / pixels.len() as f64
}
