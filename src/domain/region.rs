//! Non-overlapping rectangle regions
//!
//! A [`Region`] tracks the area that is still considered part of a surface
//! while occluders are cut out of it. Subtraction keeps the member
//! rectangles pairwise disjoint, which makes [`Region::area`] a plain sum
//! with no double counting.

use crate::domain::core::Rect;

/// Set of rectangles with no positive-area overlap between members
///
/// Regions are values: every operation returns a new region and leaves the
/// receiver untouched. Members that merely touch, or exact duplicates added
/// through [`Region::insert`], are allowed; only subtraction is required to
/// preserve disjointness.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates a region with no rectangles
    pub fn empty() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering a single rectangle
    ///
    /// Empty, null and infinite rectangles produce the empty region.
    ///
    /// # Example
    /// ```rust
    /// use window_occlusion::domain::{core::Rect, region::Region};
    ///
    /// let region = Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
    /// assert_eq!(region.area(), 100.0);
    /// assert!(Region::from_rect(Rect::NULL).is_empty());
    /// ```
    pub fn from_rect(rect: Rect) -> Self {
        if rect.is_contributing() {
            Self { rects: vec![rect] }
        } else {
            Self::empty()
        }
    }

    /// Returns a region with `rect` appended
    ///
    /// Insertion does not remove overlap with existing members. Use it to
    /// build a region from rectangles already known to be disjoint.
    pub fn insert(&self, rect: Rect) -> Self {
        let mut rects = self.rects.clone();
        if rect.is_contributing() {
            rects.push(rect);
        }
        Self { rects }
    }

    /// Returns the region with `cutter` removed from every member
    ///
    /// Each member is replaced by the pieces of it that `cutter` does not
    /// cover. Pieces of different members are never merged. A
    /// non-contributing cutter leaves the region unchanged.
    ///
    /// # Example
    /// ```rust
    /// use window_occlusion::domain::{core::Rect, region::Region};
    ///
    /// let region = Region::from_rect(Rect::new(0.0, 0.0, 200.0, 200.0))
    ///     .subtract(Rect::new(0.0, 0.0, 100.0, 100.0));
    /// assert_eq!(region.area(), 30000.0);
    /// assert_eq!(region.len(), 2);
    /// ```
    pub fn subtract(&self, cutter: Rect) -> Self {
        if !cutter.is_contributing() {
            return self.clone();
        }

        let rects = self
            .rects
            .iter()
            .flat_map(|member| member.subtract(&cutter))
            .collect();

        Self { rects }
    }

    /// Subtracts every rectangle of `cutters` in order
    ///
    /// The order changes intermediate fragmentation but not the covered
    /// footprint or the final area.
    pub fn subtract_all<I>(&self, cutters: I) -> Self
    where
        I: IntoIterator<Item = Rect>,
    {
        cutters
            .into_iter()
            .fold(self.clone(), |region, cutter| region.subtract(cutter))
    }

    /// Total area of the region
    pub fn area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Returns true when the region has no members
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of member rectangles
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Member rectangles in order
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Consumes the region and returns its members
    pub fn into_rects(self) -> Vec<Rect> {
        self.rects
    }

    /// Bounding box of all members, or None for the empty region
    pub fn bounds(&self) -> Option<Rect> {
        let mut members = self.rects.iter();
        let first = *members.next()?;
        Some(members.fold(first, |acc, rect| acc.union(rect)))
    }

    /// Returns true if any member overlaps `rect` with positive area
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|member| member.intersects(rect))
    }

    /// Returns true if any member contains the given point
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        self.rects.iter().any(|member| member.contains_point(px, py))
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Region::empty(), |region, rect| region.insert(rect))
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(region: &Region) {
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                assert!(!a.intersects(b), "members overlap: {:?} and {:?}", a, b);
            }
        }
    }

    /// Small deterministic generator so property-style tests stay reproducible
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn rect_within(&mut self, extent: u64) -> Rect {
            let x = (self.next() % extent) as f64;
            let y = (self.next() % extent) as f64;
            let w = (self.next() % (extent / 2) + 1) as f64;
            let h = (self.next() % (extent / 2) + 1) as f64;
            Rect::new(x, y, w, h)
        }
    }

    #[test]
    fn empty_region() {
        let region = Region::empty();
        assert!(region.is_empty());
        assert_eq!(region.area(), 0.0);
        assert_eq!(region.bounds(), None);
    }

    #[test]
    fn from_rect_filters_degenerate_input() {
        assert!(Region::from_rect(Rect::new(0.0, 0.0, 0.0, 10.0)).is_empty());
        assert!(Region::from_rect(Rect::new(0.0, 0.0, -5.0, 10.0)).is_empty());
        assert!(Region::from_rect(Rect::NULL).is_empty());
        assert!(Region::from_rect(Rect::INFINITE).is_empty());

        let region = Region::from_rect(Rect::new(5.0, 5.0, 10.0, 20.0));
        assert_eq!(region.len(), 1);
        assert_eq!(region.area(), 200.0);
    }

    #[test]
    fn subtract_degenerate_is_noop() {
        let region = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(region.subtract(Rect::NULL), region);
        assert_eq!(region.subtract(Rect::INFINITE), region);
        assert_eq!(region.subtract(Rect::new(10.0, 10.0, 0.0, 50.0)), region);
    }

    #[test]
    fn subtract_leaves_receiver_untouched() {
        let region = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let cut = region.subtract(Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(region.area(), 10000.0);
        assert_eq!(cut.area(), 7500.0);
    }

    #[test]
    fn full_coverage_removes_member_without_residue() {
        let region = Region::from_rect(Rect::new(10.0, 10.0, 30.0, 30.0));
        let cut = region.subtract(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(cut.is_empty());
        assert_eq!(cut.area(), 0.0);
    }

    #[test]
    fn overlapping_cutters_do_not_double_count() {
        let region = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let cut = region.subtract_all([
            Rect::new(0.0, 0.0, 60.0, 100.0),
            Rect::new(40.0, 0.0, 60.0, 100.0),
        ]);
        assert!(cut.is_empty());
        assert_eq!(cut.area(), 0.0);
    }

    #[test]
    fn partial_overlap_round_trip() {
        let target = Rect::new(0.0, 0.0, 120.0, 90.0);
        let cutter = Rect::new(70.0, 30.0, 100.0, 20.0);
        let region = Region::from_rect(target).subtract(cutter);

        assert_disjoint(&region);
        let overlap = target.intersection(&cutter).unwrap().area();
        assert_eq!(region.area(), target.area() - overlap);
        assert!(!region.intersects(&cutter));
    }

    #[test]
    fn subtraction_order_does_not_change_area() {
        let base = Region::from_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let cutters = [
            Rect::new(10.0, 10.0, 30.0, 30.0),
            Rect::new(20.0, 20.0, 50.0, 10.0),
            Rect::new(60.0, 0.0, 5.0, 100.0),
        ];
        let mut reversed = cutters;
        reversed.reverse();

        let forward = base.subtract_all(cutters);
        let backward = base.subtract_all(reversed);
        assert_eq!(forward.area(), backward.area());

        // Same footprint: probe pixel centres
        for y in 0..100 {
            for x in 0..100 {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                assert_eq!(forward.contains_point(px, py), backward.contains_point(px, py));
            }
        }
    }

    #[test]
    fn random_subtractions_keep_invariants() {
        let mut rng = Lcg(0x5eed);

        for _ in 0..200 {
            let mut region = Region::from_rect(Rect::new(0.0, 0.0, 64.0, 64.0));
            for _ in 0..8 {
                let cutter = rng.rect_within(64);
                let before = region.area();
                let touched = region.intersects(&cutter);
                region = region.subtract(cutter);

                assert_disjoint(&region);
                assert!(region.area() <= before);
                if touched {
                    assert!(region.area() < before);
                } else {
                    assert_eq!(region.area(), before);
                }
                assert!(!region.intersects(&cutter));
            }
        }
    }

    #[test]
    fn collect_and_bounds() {
        let region: Region = vec![
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::NULL,
            Rect::new(20.0, 5.0, 10.0, 10.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(region.len(), 2);
        assert_eq!(region.area(), 200.0);
        assert_eq!(region.bounds(), Some(Rect::new(0.0, 0.0, 30.0, 15.0)));
    }
}
