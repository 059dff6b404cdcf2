//! Core geometry types and operations
//!
//! This module defines the rectangle primitive shared by the region algebra
//! and the occlusion calculator. Coordinates are screen points in `f64`; the
//! platform layer is responsible for converting native window bounds.

/// Axis-aligned rectangle in screen coordinates
///
/// A rectangle is a plain value: it has no identity beyond its coordinates.
/// Besides ordinary rectangles there are two sentinel states, [`Rect::NULL`]
/// (no geometry at all) and [`Rect::INFINITE`] (unbounded). Neither sentinel,
/// nor any empty or non-finite rectangle, ever contributes area to a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// The null rectangle: no geometry, intersects nothing
    pub const NULL: Rect = Rect {
        x: f64::INFINITY,
        y: f64::INFINITY,
        w: 0.0,
        h: 0.0,
    };

    /// The unbounded rectangle
    pub const INFINITE: Rect = Rect {
        x: -f64::MAX / 2.0,
        y: -f64::MAX / 2.0,
        w: f64::MAX,
        h: f64::MAX,
    };

    /// Creates a new rectangle
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Creates a rectangle from its left, top, right and bottom edges
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Returns the left edge coordinate
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Returns the top edge coordinate
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Returns true for the null sentinel
    pub fn is_null(&self) -> bool {
        self.x == f64::INFINITY || self.y == f64::INFINITY
    }

    /// Returns true for unbounded rectangles
    pub fn is_infinite(&self) -> bool {
        !self.is_null()
            && (self.w.is_infinite()
                || self.h.is_infinite()
                || self.w >= f64::MAX
                || self.h >= f64::MAX)
    }

    /// Returns true when the rectangle encloses no area
    ///
    /// Negative sizes are not standardised: a rectangle with a negative width
    /// or height is empty, as is any rectangle with a NaN component.
    pub fn is_empty(&self) -> bool {
        if self.is_null() {
            return true;
        }
        // `!(w > 0)` also catches NaN
        !(self.w > 0.0) || !(self.h > 0.0) || self.x.is_nan() || self.y.is_nan()
    }

    /// Returns true when the rectangle can take part in region operations
    pub fn is_contributing(&self) -> bool {
        !self.is_empty()
            && !self.is_infinite()
            && self.x.is_finite()
            && self.y.is_finite()
            && self.right().is_finite()
            && self.bottom().is_finite()
    }

    /// Returns the area of the rectangle, zero for empty rectangles
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.w * self.h
        }
    }

    /// Returns true if this rectangle contains the given point
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        !self.is_empty() && px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns true if `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Returns the intersection of two rectangles, or None unless they
    /// overlap with positive area
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }

        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if left < right && top < bottom {
            Some(Rect::from_edges(left, top, right, bottom))
        } else {
            None
        }
    }

    /// Returns true if the two rectangles overlap with positive area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Returns the bounding box that contains both rectangles
    ///
    /// Empty rectangles are ignored; the union of two empty rectangles is
    /// [`Rect::NULL`].
    pub fn union(&self, other: &Rect) -> Rect {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => Rect::NULL,
            (true, false) => *other,
            (false, true) => *self,
            (false, false) => Rect::from_edges(
                self.x.min(other.x),
                self.y.min(other.y),
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        }
    }

    /// Returns the parts of this rectangle not covered by `cutter`
    ///
    /// The result holds at most four pieces: full-width strips above and
    /// below the intersection, then intersection-height strips to its left
    /// and right. The pieces are pairwise disjoint and together cover exactly
    /// `self` minus the intersection. Zero-area strips are omitted.
    pub fn subtract(&self, cutter: &Rect) -> Vec<Rect> {
        let Some(i) = self.intersection(cutter) else {
            return vec![*self];
        };

        if cutter.contains_rect(self) {
            return Vec::new();
        }

        let mut pieces = Vec::with_capacity(4);

        // Top and bottom strips span the full width
        if i.top() > self.top() {
            pieces.push(Rect::from_edges(self.left(), self.top(), self.right(), i.top()));
        }
        if i.bottom() < self.bottom() {
            pieces.push(Rect::from_edges(self.left(), i.bottom(), self.right(), self.bottom()));
        }

        // Side strips are limited to the intersection's vertical span
        if i.left() > self.left() {
            pieces.push(Rect::from_edges(self.left(), i.top(), i.left(), i.bottom()));
        }
        if i.right() < self.right() {
            pieces.push(Rect::from_edges(i.right(), i.top(), self.right(), i.bottom()));
        }

        pieces.retain(|piece| !piece.is_empty());
        pieces
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}
