//! Coordinate model for the overlay.
//!
//! Pointer positions arrive in container pixels (origin top-left, y down) and
//! are mapped to page-relative percentages (0–100 on each axis) before the
//! interaction state machine sees them. Everything stored on a highlight is in
//! percentages, so zoom, DPI and container size never leak into the engine.

use serde::{Deserialize, Serialize};

use super::error::GeometryError;

/// Upper bound of the page-relative coordinate space on each axis.
pub const PAGE_EXTENT: f32 = 100.0;

/// A position in container pixels (origin at the container's top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A position in page-relative percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePoint {
    pub x: f32,
    pub y: f32,
}

impl PagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, PAGE_EXTENT),
            y: self.y.clamp(0.0, PAGE_EXTENT),
        }
    }

    pub fn offset_from(self, other: PagePoint) -> PagePoint {
        PagePoint::new(self.x - other.x, self.y - other.y)
    }

    pub fn minus(self, offset: PagePoint) -> PagePoint {
        PagePoint::new(self.x - offset.x, self.y - offset.y)
    }
}

/// The pixel rectangle of the rendered page surface inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ContainerRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rect from two opposite pixel corners, in any order.
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self {
            left,
            top,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > f32::EPSILON && self.height > f32::EPSILON)
    }

    /// True when `point` lies on the page surface, edges included.
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.left
            && point.x <= self.left + self.width
            && point.y >= self.top
            && point.y <= self.top + self.height
    }

    /// Pixels per percent along each axis.
    pub fn pixels_per_percent(&self) -> (f32, f32) {
        (self.width / PAGE_EXTENT, self.height / PAGE_EXTENT)
    }

    pub fn to_percent(&self, point: PixelPoint) -> PagePoint {
        to_percent(point, self)
    }

    pub fn to_pixel(&self, point: PagePoint) -> PixelPoint {
        to_pixel(point, self)
    }
}

/// Map a container pixel position to page percentages.
///
/// Points outside the container are not rejected; the result may fall outside
/// `[0, 100]` and callers clamp before committing. A degenerate container maps
/// every point to the origin.
pub fn to_percent(point: PixelPoint, container: &ContainerRect) -> PagePoint {
    if container.is_degenerate() {
        return PagePoint::default();
    }
    PagePoint {
        x: (point.x - container.left) * PAGE_EXTENT / container.width,
        y: (point.y - container.top) * PAGE_EXTENT / container.height,
    }
}

/// Inverse of [`to_percent`].
pub fn to_pixel(point: PagePoint, container: &ContainerRect) -> PixelPoint {
    PixelPoint {
        x: container.left + point.x * container.width / PAGE_EXTENT,
        y: container.top + point.y * container.height / PAGE_EXTENT,
    }
}

/// Allowed highlight size range, in percent of the page on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 80.0,
        }
    }
}

impl SizeLimits {
    /// Build limits, repairing inverted or out-of-range values.
    pub fn new(min: f32, max: f32) -> Self {
        let min = min.clamp(0.0, PAGE_EXTENT);
        let max = max.clamp(min, PAGE_EXTENT);
        Self { min, max }
    }

    pub fn clamp(&self, size: f32) -> f32 {
        size.clamp(self.min, self.max)
    }
}

/// A corner of a highlight, named by compass direction (north is the top of
/// the page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthWest,
        Corner::SouthEast,
    ];

    pub fn opposite(self) -> Corner {
        match self {
            Corner::NorthWest => Corner::SouthEast,
            Corner::NorthEast => Corner::SouthWest,
            Corner::SouthWest => Corner::NorthEast,
            Corner::SouthEast => Corner::NorthWest,
        }
    }

    /// Short lowercase label ("nw", "se", ...).
    pub fn label(self) -> &'static str {
        match self {
            Corner::NorthWest => "nw",
            Corner::NorthEast => "ne",
            Corner::SouthWest => "sw",
            Corner::SouthEast => "se",
        }
    }
}

/// Center-based rectangle in page percentages.
///
/// The center representation lets a resize keep the opposite corner fixed
/// while deriving the new center once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightRect {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl HighlightRect {
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Axis-aligned box spanned by two points; sizes are absolute deltas.
    pub fn from_corners(a: PagePoint, b: PagePoint) -> Self {
        Self {
            center_x: (a.x + b.x) / 2.0,
            center_y: (a.y + b.y) / 2.0,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn center(&self) -> PagePoint {
        PagePoint::new(self.center_x, self.center_y)
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.center_y + self.height / 2.0
    }

    pub fn corner(&self, corner: Corner) -> PagePoint {
        match corner {
            Corner::NorthWest => PagePoint::new(self.left(), self.top()),
            Corner::NorthEast => PagePoint::new(self.right(), self.top()),
            Corner::SouthWest => PagePoint::new(self.left(), self.bottom()),
            Corner::SouthEast => PagePoint::new(self.right(), self.bottom()),
        }
    }

    pub fn contains(&self, point: PagePoint) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn with_center(self, center: PagePoint) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            ..self
        }
    }

    /// Size into `limits`, center into `[0, 100]`.
    pub fn clamped(self, limits: &SizeLimits) -> Self {
        let center = self.center().clamped();
        Self {
            center_x: center.x,
            center_y: center.y,
            width: limits.clamp(self.width),
            height: limits.clamp(self.height),
        }
    }

    /// Rectangle with one corner pinned at `fixed` and the opposite corner
    /// following `pointer`. Sizes are clamped while staying anchored at
    /// `fixed`; the resulting center is clamped into the page.
    pub fn anchored(fixed: PagePoint, pointer: PagePoint, limits: &SizeLimits) -> Self {
        let dx = pointer.x - fixed.x;
        let dy = pointer.y - fixed.y;
        let width = limits.clamp(dx.abs());
        let height = limits.clamp(dy.abs());
        let sign_x = if dx < 0.0 { -1.0 } else { 1.0 };
        let sign_y = if dy < 0.0 { -1.0 } else { 1.0 };
        let center = PagePoint::new(
            fixed.x + sign_x * width / 2.0,
            fixed.y + sign_y * height / 2.0,
        )
        .clamped();
        Self {
            center_x: center.x,
            center_y: center.y,
            width,
            height,
        }
    }

    /// Check the stored-geometry invariant.
    pub fn validate(&self, limits: &SizeLimits) -> Result<(), GeometryError> {
        let finite = [self.center_x, self.center_y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeometryError::NotFinite);
        }
        if !(0.0..=PAGE_EXTENT).contains(&self.center_x)
            || !(0.0..=PAGE_EXTENT).contains(&self.center_y)
        {
            return Err(GeometryError::CenterOutOfPage {
                x: self.center_x,
                y: self.center_y,
            });
        }
        if self.width < limits.min
            || self.width > limits.max
            || self.height < limits.min
            || self.height > limits.max
        {
            return Err(GeometryError::SizeOutOfRange {
                width: self.width,
                height: self.height,
                min: limits.min,
                max: limits.max,
            });
        }
        Ok(())
    }

    /// Approximate equality, used to skip persisting no-op gestures.
    pub fn approx_eq(&self, other: &HighlightRect) -> bool {
        const EPS: f32 = 1e-4;
        (self.center_x - other.center_x).abs() < EPS
            && (self.center_y - other.center_y).abs() < EPS
            && (self.width - other.width).abs() < EPS
            && (self.height - other.height).abs() < EPS
    }
}
