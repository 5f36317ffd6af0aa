//! Proximity trigger for infinite scrolling.
//!
//! The gallery places a sentinel element after the last image. A page load is
//! scheduled as soon as the sentinel comes within `root_margin` pixels of the
//! viewport, so the next page is usually fetched before the user reaches the
//! bottom.

/// Default prefetch distance in pixels.
pub const DEFAULT_ROOT_MARGIN: f64 = 400.0;

/// Visible region of the scroll container, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Scroll offset of the top edge
    pub top: f64,

    pub height: f64,
}

impl Viewport {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Position of the sentinel element, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelBox {
    pub top: f64,
    pub height: f64,
}

impl SentinelBox {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

/// Intersection test with an expanded viewport.
///
/// Behaves like an `IntersectionObserver` with threshold 0: touching edges
/// count as visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentinel {
    root_margin: f64,
}

impl Default for Sentinel {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_MARGIN)
    }
}

impl Sentinel {
    pub fn new(root_margin: f64) -> Self {
        Self {
            root_margin: root_margin.max(0.0),
        }
    }

    pub fn root_margin(&self) -> f64 {
        self.root_margin
    }

    /// Whether the sentinel lies within the margin-expanded viewport.
    pub fn in_view(&self, viewport: Viewport, sentinel: SentinelBox) -> bool {
        let top = viewport.top - self.root_margin;
        let bottom = viewport.bottom() + self.root_margin;

        sentinel.top <= bottom && sentinel.top + sentinel.height >= top
    }
}
