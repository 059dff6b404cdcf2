//! Surface selection queries
//!
//! A [`SurfaceQuery`] is a small expression tree of attribute tests joined by
//! `and`, `or` and `not`. Queries select which surfaces a caller wants to
//! analyse; they never influence which surfaces count as occluders.

use std::fmt;
use std::sync::Arc;

use crate::domain::surface::{ProcessId, SurfaceDescriptor, SurfaceId};

/// Predicate signature for [`SurfaceQuery::Custom`]
pub type SurfacePredicate = Arc<dyn Fn(&SurfaceDescriptor) -> bool + Send + Sync>;

/// Case-insensitive text pattern
///
/// `*` matches any run of characters and `?` a single character. A pattern
/// without wildcards must match the whole text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    pattern: Vec<char>,
}

impl NamePattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_lowercase().chars().collect(),
        }
    }

    /// Pattern matching any text that contains `fragment`
    pub fn containing(fragment: &str) -> Self {
        Self::new(&format!("*{fragment}*"))
    }

    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.to_lowercase().chars().collect();
        wildcard_match(&self.pattern, &text)
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern.iter().collect::<String>())
    }
}

/// Iterative wildcard match with single-star backtracking
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        // A star in the pattern is always a wildcard, even facing a literal '*'
        if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = t;
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Expression tree selecting surfaces by attribute
#[derive(Clone)]
pub enum SurfaceQuery {
    /// Matches every surface
    All,
    /// Surface with the given id
    Id(SurfaceId),
    /// Surfaces owned by the given process
    Process(ProcessId),
    /// Owner application name matches the pattern
    OwnerName(NamePattern),
    /// Title matches the pattern; surfaces without a title never match
    Title(NamePattern),
    /// Frame area is at least the given value
    MinArea(f64),
    /// Surface sits on the given layer
    Layer(i32),
    /// Surface is currently shown
    OnScreen,
    /// Arbitrary predicate
    Custom(SurfacePredicate),
    And(Box<SurfaceQuery>, Box<SurfaceQuery>),
    Or(Box<SurfaceQuery>, Box<SurfaceQuery>),
    Not(Box<SurfaceQuery>),
}

impl SurfaceQuery {
    pub fn all() -> Self {
        SurfaceQuery::All
    }

    pub fn id(id: SurfaceId) -> Self {
        SurfaceQuery::Id(id)
    }

    pub fn process(process_id: ProcessId) -> Self {
        SurfaceQuery::Process(process_id)
    }

    pub fn owner_name(pattern: &str) -> Self {
        SurfaceQuery::OwnerName(NamePattern::new(pattern))
    }

    pub fn title(pattern: &str) -> Self {
        SurfaceQuery::Title(NamePattern::new(pattern))
    }

    pub fn title_contains(fragment: &str) -> Self {
        SurfaceQuery::Title(NamePattern::containing(fragment))
    }

    pub fn min_area(area: f64) -> Self {
        SurfaceQuery::MinArea(area)
    }

    pub fn layer(layer: i32) -> Self {
        SurfaceQuery::Layer(layer)
    }

    pub fn on_screen() -> Self {
        SurfaceQuery::OnScreen
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&SurfaceDescriptor) -> bool + Send + Sync + 'static,
    {
        SurfaceQuery::Custom(Arc::new(predicate))
    }

    pub fn and(self, other: SurfaceQuery) -> Self {
        SurfaceQuery::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: SurfaceQuery) -> Self {
        SurfaceQuery::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        SurfaceQuery::Not(Box::new(self))
    }

    /// Evaluates the query against one surface
    pub fn matches(&self, surface: &SurfaceDescriptor) -> bool {
        match self {
            SurfaceQuery::All => true,
            SurfaceQuery::Id(id) => surface.id == *id,
            SurfaceQuery::Process(process_id) => surface.process_id == *process_id,
            SurfaceQuery::OwnerName(pattern) => surface
                .owner_name
                .as_deref()
                .is_some_and(|name| pattern.matches(name)),
            SurfaceQuery::Title(pattern) => surface
                .title
                .as_deref()
                .is_some_and(|title| pattern.matches(title)),
            SurfaceQuery::MinArea(area) => surface.area() >= *area,
            SurfaceQuery::Layer(layer) => surface.layer == *layer,
            SurfaceQuery::OnScreen => surface.is_on_screen,
            SurfaceQuery::Custom(predicate) => predicate(surface),
            SurfaceQuery::And(lhs, rhs) => lhs.matches(surface) && rhs.matches(surface),
            SurfaceQuery::Or(lhs, rhs) => lhs.matches(surface) || rhs.matches(surface),
            SurfaceQuery::Not(inner) => !inner.matches(surface),
        }
    }

    /// Surfaces the query selects, in their original order
    pub fn select<'a>(&self, surfaces: &'a [SurfaceDescriptor]) -> Vec<&'a SurfaceDescriptor> {
        surfaces.iter().filter(|surface| self.matches(surface)).collect()
    }

    /// First surface the query selects
    pub fn first<'a>(&self, surfaces: &'a [SurfaceDescriptor]) -> Option<&'a SurfaceDescriptor> {
        surfaces.iter().find(|surface| self.matches(surface))
    }
}

impl Default for SurfaceQuery {
    fn default() -> Self {
        SurfaceQuery::All
    }
}

impl fmt::Debug for SurfaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceQuery::All => write!(f, "All"),
            SurfaceQuery::Id(id) => write!(f, "Id({id})"),
            SurfaceQuery::Process(pid) => write!(f, "Process({pid})"),
            SurfaceQuery::OwnerName(pattern) => write!(f, "OwnerName({pattern})"),
            SurfaceQuery::Title(pattern) => write!(f, "Title({pattern})"),
            SurfaceQuery::MinArea(area) => write!(f, "MinArea({area})"),
            SurfaceQuery::Layer(layer) => write!(f, "Layer({layer})"),
            SurfaceQuery::OnScreen => write!(f, "OnScreen"),
            SurfaceQuery::Custom(_) => write!(f, "Custom(..)"),
            SurfaceQuery::And(lhs, rhs) => write!(f, "And({lhs:?}, {rhs:?})"),
            SurfaceQuery::Or(lhs, rhs) => write!(f, "Or({lhs:?}, {rhs:?})"),
            SurfaceQuery::Not(inner) => write!(f, "Not({inner:?})"),
        }
    }
}
