//! Tile grid with solidity, line-of-sight, and fog-of-war queries.
//!
//! The map never resolves collisions itself. It only reports how far a
//! query point penetrates a wall tile; bodies do their own de-penetration.
//!
//! Anything outside the map's world-space boundary is open space: not solid
//! and not sight-blocking.

use serde::{Deserialize, Serialize};

use crate::data::LevelData;
use crate::error::DataError;
use crate::math::{Rect, Vec2};

/// Nothing drawn, walkable.
pub const TILE_EMPTY: u32 = 0;
/// The only solid tile id.
pub const TILE_WALL: u32 = 1;
/// Plain floor. Ids from here up are walkable decoration.
pub const TILE_FLOOR: u32 = 2;

/// Layout of the tileset texture the renderer draws tiles from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Cells per row.
    pub columns: u32,
    /// Rows of cells.
    pub rows: u32,
    /// Texture width in pixels.
    pub width: f32,
    /// Texture height in pixels.
    pub height: f32,
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 1,
            width: 128.0,
            height: 32.0,
        }
    }
}

/// A level's tile grid plus its explored bitset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    tile_size: f32,
    origin: Vec2,
    tiles: Vec<u32>,
    explored: Vec<bool>,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    texture_areas: Vec<Rect>,
}

impl TileMap {
    /// Build a map centered on `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::TileCountMismatch`] if `tiles` does not hold
    /// exactly `width * height` entries, or [`DataError::InvalidValue`] for a
    /// non-positive tile size.
    pub fn new(
        width: u32,
        height: u32,
        tiles: Vec<u32>,
        tile_size: f32,
        origin: Vec2,
        atlas: AtlasLayout,
    ) -> Result<Self, DataError> {
        let expected = (width * height) as usize;
        if tiles.len() != expected {
            return Err(DataError::TileCountMismatch {
                name: String::from("<map>"),
                expected,
                actual: tiles.len(),
            });
        }
        if tile_size <= 0.0 || !tile_size.is_finite() {
            return Err(DataError::InvalidValue {
                field: String::from("tile_size"),
                message: format!("must be positive, got {tile_size}"),
            });
        }

        let half_w = width as f32 * tile_size / 2.0;
        let half_h = height as f32 * tile_size / 2.0;

        let cell_w = atlas.width / atlas.columns.max(1) as f32;
        let cell_h = atlas.height / atlas.rows.max(1) as f32;
        let texture_areas = (0..atlas.rows)
            .flat_map(|row| {
                (0..atlas.columns).map(move |col| {
                    Rect::new(col as f32 * cell_w, row as f32 * cell_h, cell_w, cell_h)
                })
            })
            .collect();

        Ok(Self {
            width,
            height,
            tile_size,
            origin,
            tiles,
            explored: vec![false; expected],
            left: origin.x - half_w,
            right: origin.x + half_w,
            top: origin.y - half_h,
            bottom: origin.y + half_h,
            texture_areas,
        })
    }

    /// Build a map from level content.
    ///
    /// # Errors
    ///
    /// See [`TileMap::new`]; the mismatch error carries the level's name.
    pub fn from_level(level: &LevelData) -> Result<Self, DataError> {
        Self::new(
            level.width,
            level.height,
            level.tiles.clone(),
            level.tile_size,
            Vec2::from(level.origin),
            level.atlas,
        )
        .map_err(|err| match err {
            DataError::TileCountMismatch {
                expected, actual, ..
            } => DataError::TileCountMismatch {
                name: level.name.clone(),
                expected,
                actual,
            },
            other => other,
        })
    }

    /// Columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of one tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World-space center of the map.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World-space boundary as `(left, top, right, bottom)`.
    #[must_use]
    pub const fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.left, self.top, self.right, self.bottom)
    }

    /// Atlas source rectangle for a tile id. Empty tiles have none.
    #[must_use]
    pub fn texture_area(&self, tile: u32) -> Option<Rect> {
        tile.checked_sub(1)
            .and_then(|i| self.texture_areas.get(i as usize))
            .copied()
    }

    /// Tile id at grid coordinates.
    #[must_use]
    pub fn tile_at(&self, col: u32, row: u32) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles.get(self.index(col, row)).copied()
    }

    /// Grid coordinates of a world position, if inside the grid.
    #[must_use]
    pub fn tile_coords(&self, pos: Vec2) -> Option<(u32, u32)> {
        let col = ((pos.x - self.left) / self.tile_size).floor();
        let row = ((pos.y - self.top) / self.tile_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        Some((col as u32, row as u32))
    }

    /// World-space center of a tile.
    #[must_use]
    pub fn tile_center(&self, col: u32, row: u32) -> Vec2 {
        Vec2::new(
            self.left + col as f32 * self.tile_size + self.tile_size / 2.0,
            self.top + row as f32 * self.tile_size + self.tile_size / 2.0,
        )
    }

    fn index(&self, col: u32, row: u32) -> usize {
        (row * self.width + col) as usize
    }

    /// Report whether `pos` lies inside a wall tile.
    ///
    /// Returns the penetration depth on each axis (half a tile minus the
    /// distance to the tile center, floored at zero) for a wall, `None` for
    /// anything else including points outside the map.
    #[must_use]
    pub fn solid_tile_at(&self, pos: Vec2) -> Option<Vec2> {
        if pos.x < self.left || pos.x > self.right || pos.y < self.top || pos.y > self.bottom {
            return None;
        }

        let (col, row) = self.tile_coords(pos)?;
        if self.tile_at(col, row)? != TILE_WALL {
            return None;
        }

        let centre = self.tile_center(col, row);
        let half = self.tile_size / 2.0;
        Some(Vec2::new(
            (half - (pos.x - centre.x).abs()).max(0.0),
            (half - (pos.y - centre.y).abs()).max(0.0),
        ))
    }

    /// Whether `pos` is inside a wall tile.
    #[must_use]
    pub fn is_solid(&self, pos: Vec2) -> bool {
        self.solid_tile_at(pos).is_some()
    }

    /// March from `start` to `end` in steps of a third of a tile and report
    /// whether no wall tile was sampled.
    #[must_use]
    pub fn has_line_of_sight(&self, start: Vec2, end: Vec2) -> bool {
        let diff = end - start;
        let dist = diff.length();
        if dist < 1.0 {
            return true;
        }

        let dir = diff / dist;
        let step = self.tile_size / 3.0;
        let mut d = 0.0;
        while d < dist {
            let sample = start + dir * d;
            if let Some((col, row)) = self.tile_coords(sample) {
                if self.tile_at(col, row) == Some(TILE_WALL) {
                    return false;
                }
            }
            d += step;
        }

        true
    }

    /// Permanently mark every tile within `radius` world units of the tile
    /// containing `center` as explored.
    ///
    /// Returns how many tiles flipped to explored.
    pub fn reveal_tiles(&mut self, center: Vec2, radius: f32) -> usize {
        let cx = ((center.x - self.left) / self.tile_size).floor() as i64;
        let cy = ((center.y - self.top) / self.tile_size).floor() as i64;
        let tile_radius = radius / self.tile_size;
        let reach = tile_radius.ceil() as i64;

        let start_x = (cx - reach).max(0);
        let end_x = (cx + reach).min(self.width as i64 - 1);
        let start_y = (cy - reach).max(0);
        let end_y = (cy + reach).min(self.height as i64 - 1);

        let mut revealed = 0;
        for y in start_y..=end_y {
            for x in start_x..=end_x {
                let dx = (x - cx) as f32;
                let dy = (y - cy) as f32;
                if (dx * dx + dy * dy).sqrt() <= tile_radius {
                    let idx = self.index(x as u32, y as u32);
                    if let Some(cell) = self.explored.get_mut(idx) {
                        if !*cell {
                            *cell = true;
                            revealed += 1;
                        }
                    }
                }
            }
        }
        revealed
    }

    /// Whether a tile has been explored.
    #[must_use]
    pub fn is_explored(&self, col: u32, row: u32) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        self.explored
            .get(self.index(col, row))
            .copied()
            .unwrap_or(false)
    }

    /// The explored bitset, row-major.
    #[must_use]
    pub fn explored(&self) -> &[bool] {
        &self.explored
    }

    /// Number of explored tiles.
    #[must_use]
    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|&&e| e).count()
    }

    /// Restore explored state carried over from an earlier visit.
    ///
    /// Tiles already explored stay explored.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::ExploredLengthMismatch`] if the length differs
    /// from the tile count.
    pub fn set_explored(&mut self, explored: &[bool]) -> Result<(), DataError> {
        if explored.len() != self.explored.len() {
            return Err(DataError::ExploredLengthMismatch {
                expected: self.explored.len(),
                actual: explored.len(),
            });
        }
        for (cell, &seen) in self.explored.iter_mut().zip(explored) {
            *cell |= seen;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5 room of floor with a wall ring, origin at the map center.
    fn room() -> TileMap {
        #[rustfmt::skip]
        let tiles = vec![
            1, 1, 1, 1, 1,
            1, 2, 2, 2, 1,
            1, 2, 1, 2, 1,
            1, 2, 2, 2, 1,
            1, 1, 1, 1, 1,
        ];
        TileMap::new(5, 5, tiles, 32.0, Vec2::ZERO, AtlasLayout::default()).unwrap()
    }

    #[test]
    fn test_bounds_centered_on_origin() {
        let map = room();
        assert_eq!(map.bounds(), (-80.0, -80.0, 80.0, 80.0));
    }

    #[test]
    fn test_tile_count_mismatch() {
        let err = TileMap::new(2, 2, vec![1, 1, 1], 32.0, Vec2::ZERO, AtlasLayout::default());
        assert!(matches!(
            err,
            Err(DataError::TileCountMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_outside_bounds_is_open() {
        let map = room();
        assert!(map.solid_tile_at(Vec2::new(-81.0, 0.0)).is_none());
        assert!(map.solid_tile_at(Vec2::new(0.0, 200.0)).is_none());
    }

    #[test]
    fn test_only_wall_id_is_solid() {
        let map = room();
        // Floor tile (1,1)
        assert!(map.solid_tile_at(Vec2::new(-32.0, -32.0)).is_none());
        // Center pillar
        assert!(map.solid_tile_at(Vec2::ZERO).is_some());
    }

    #[test]
    fn test_wall_overlap_depth() {
        let map = room();
        // Pillar centre is (0,0), tile spans [-16, 16].
        let overlap = map.solid_tile_at(Vec2::new(10.0, -4.0)).unwrap();
        assert_eq!(overlap, Vec2::new(6.0, 12.0));
    }

    #[test]
    fn test_line_of_sight_blocked_by_pillar() {
        let map = room();
        assert!(!map.has_line_of_sight(Vec2::new(-40.0, 0.0), Vec2::new(40.0, 0.0)));
        assert!(map.has_line_of_sight(Vec2::new(-40.0, -40.0), Vec2::new(40.0, -40.0)));
    }

    #[test]
    fn test_line_of_sight_degenerate() {
        let map = room();
        assert!(map.has_line_of_sight(Vec2::ZERO, Vec2::new(0.5, 0.0)));
    }

    #[test]
    fn test_reveal_is_monotonic() {
        let mut map = room();
        assert_eq!(map.explored().len(), 25);
        let first = map.reveal_tiles(Vec2::ZERO, 32.0);
        // Center plus its four orthogonal neighbours.
        assert_eq!(first, 5);
        assert!(map.is_explored(2, 1));
        assert!(!map.is_explored(1, 1));

        // Revealing somewhere else never un-marks.
        map.reveal_tiles(Vec2::new(-64.0, -64.0), 0.0);
        assert!(map.is_explored(2, 2));
        assert_eq!(map.explored_count(), 6);
    }

    #[test]
    fn test_set_explored_length_checked() {
        let mut map = room();
        assert!(map.set_explored(&[true; 3]).is_err());
        let mut carried = vec![false; 25];
        carried[0] = true;
        map.set_explored(&carried).unwrap();
        assert!(map.is_explored(0, 0));
    }

    #[test]
    fn test_texture_areas() {
        let map = room();
        assert_eq!(map.texture_area(TILE_EMPTY), None);
        assert_eq!(map.texture_area(TILE_WALL), Some(Rect::new(0.0, 0.0, 32.0, 32.0)));
        assert_eq!(map.texture_area(TILE_FLOOR), Some(Rect::new(32.0, 0.0, 32.0, 32.0)));
    }
}
