//! Geometry helpers shared by the map, bodies, and perception.
//!
//! World space is 2D with +x to the right and +y pointing down the screen,
//! so "up" is negative y.

use serde::{Deserialize, Serialize};

pub use glam::Vec2;

/// Vectors shorter than this are treated as zero when normalizing.
pub const EPSILON: f32 = 1.0e-6;

/// One of the four cardinal facings.
///
/// Facing drives both the animation row and the unit vector used by the
/// sight cone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    /// Facing -x.
    Left,
    /// Facing -y.
    Up,
    /// Facing +x.
    #[default]
    Right,
    /// Facing +y.
    Down,
}

impl Direction {
    /// All four facings in clockwise order starting from `Up`.
    pub const CLOCKWISE: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit vector for this facing.
    #[must_use]
    pub const fn unit_vector(self) -> Vec2 {
        match self {
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
        }
    }

    /// The cardinal opposite.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Next facing when turning clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Facing along whichever axis of `v` has the larger magnitude.
    ///
    /// Exact ties resolve to the vertical axis.
    #[must_use]
    pub fn from_dominant_axis(v: Vec2) -> Self {
        if v.x.abs() > v.y.abs() {
            if v.x < 0.0 {
                Self::Left
            } else {
                Self::Right
            }
        } else if v.y < 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// Normalize `v`, returning zero for degenerate input instead of NaN.
#[must_use]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len = v.length();
    if len > EPSILON {
        v / len
    } else {
        Vec2::ZERO
    }
}

/// Pixel rectangle inside a texture atlas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Source rectangle of frame `index` in a sheet of `columns` x `rows`
    /// equally sized cells, numbered row-major.
    #[must_use]
    pub fn atlas_cell(sheet: Vec2, columns: u32, rows: u32, index: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let width = sheet.x / columns as f32;
        let height = sheet.y / rows as f32;
        let col = index % columns;
        let row = index / columns;
        Self::new(col as f32 * width, row as f32 * height, width, height)
    }
}

/// Axis-aligned box described by its center and full dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Box center.
    pub center: Vec2,
    /// Full width and height.
    pub size: Vec2,
}

impl Aabb {
    /// Create a box centered on `center`.
    #[must_use]
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Signed gap between two boxes per axis. Both components negative means
    /// the boxes overlap.
    #[must_use]
    pub fn gap(&self, other: &Self) -> Vec2 {
        (self.center - other.center).abs() - (self.size + other.size) / 2.0
    }

    /// True when the boxes overlap with a strictly negative gap on both axes.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let gap = self.gap(other);
        gap.x < 0.0 && gap.y < 0.0
    }

    /// Overlap area, zero when the boxes are apart.
    #[must_use]
    pub fn overlap_area(&self, other: &Self) -> f32 {
        let gap = self.gap(other);
        if gap.x < 0.0 && gap.y < 0.0 {
            gap.x * gap.y
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposites() {
        for dir in Direction::CLOCKWISE {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_eq!(dir.unit_vector(), -dir.opposite().unit_vector());
        }
    }

    #[test]
    fn test_dominant_axis() {
        assert_eq!(Direction::from_dominant_axis(Vec2::new(3.0, 1.0)), Direction::Right);
        assert_eq!(Direction::from_dominant_axis(Vec2::new(-3.0, 1.0)), Direction::Left);
        assert_eq!(Direction::from_dominant_axis(Vec2::new(1.0, -3.0)), Direction::Up);
        assert_eq!(Direction::from_dominant_axis(Vec2::new(2.0, 2.0)), Direction::Down);
    }

    #[test]
    fn test_clockwise_cycle() {
        let mut dir = Direction::Up;
        for expected in Direction::CLOCKWISE.iter().cycle().skip(1).take(4) {
            dir = dir.clockwise();
            assert_eq!(dir, *expected);
        }
    }

    #[test]
    fn test_normalize_or_zero() {
        assert_eq!(normalize_or_zero(Vec2::ZERO), Vec2::ZERO);
        let n = normalize_or_zero(Vec2::new(3.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_aabb_touching_is_not_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&b));
        let c = Aabb::new(Vec2::new(9.0, 0.0), Vec2::splat(10.0));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_atlas_cell() {
        let rect = Rect::atlas_cell(Vec2::new(160.0, 128.0), 5, 4, 7);
        assert_eq!(rect, Rect::new(64.0, 32.0, 32.0, 32.0));
    }
}
