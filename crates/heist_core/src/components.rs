//! Plain data carried by every world body.
//!
//! Components hold state only; the rules that mutate them live in
//! [`crate::entity`], [`crate::ai`] and [`crate::flocking`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::{Direction, Rect, Vec2};

// ============================================================================
// Classification
// ============================================================================

/// What a body is, which decides the rules applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityKind {
    /// The controlled character. Always leaves breadcrumbs.
    Player,
    /// Static blocker.
    Block,
    /// Static walkable surface.
    Platform,
    /// AI-driven character (enemies and party followers).
    Npc,
    /// Interactable object such as a chest.
    Prop,
    /// Unclassified.
    #[default]
    None,
}

/// Whether a body takes part in the simulation.
///
/// Inactive bodies are skipped for update and collision and count as
/// defeated or consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntityStatus {
    /// Updated and collidable.
    #[default]
    Active,
    /// Ignored.
    Inactive,
}

/// Contact flags for the current tick. Cleared at the start of every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CollisionFlags {
    /// Blocked while moving up.
    pub top: bool,
    /// Blocked while moving down.
    pub bottom: bool,
    /// Blocked while moving left.
    pub left: bool,
    /// Blocked while moving right.
    pub right: bool,
}

impl CollisionFlags {
    /// Clear all four flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether any flag is set.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }
}

// ============================================================================
// Breadcrumbs
// ============================================================================

/// Bounded history of past positions, newest first.
///
/// Followers trace the leader's trail through this buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Breadcrumbs {
    trail: VecDeque<Vec2>,
}

impl Breadcrumbs {
    /// Maximum number of recorded positions.
    pub const CAPACITY: usize = 200;

    /// Create an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self {
            trail: VecDeque::with_capacity(Self::CAPACITY + 1),
        }
    }

    /// Record a position as the newest sample, dropping the oldest beyond
    /// capacity.
    pub fn record(&mut self, pos: Vec2) {
        self.trail.push_front(pos);
        while self.trail.len() > Self::CAPACITY {
            self.trail.pop_back();
        }
    }

    /// Sample `lag` steps back (0 is the newest).
    #[must_use]
    pub fn get(&self, lag: usize) -> Option<Vec2> {
        self.trail.get(lag).copied()
    }

    /// Number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.trail.clear();
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.trail.iter()
    }
}

// ============================================================================
// Animation
// ============================================================================

/// Atlas frame indices for each facing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DirectionalFrames {
    /// Frames while facing left.
    pub left: Vec<u32>,
    /// Frames while facing up.
    pub up: Vec<u32>,
    /// Frames while facing right.
    pub right: Vec<u32>,
    /// Frames while facing down.
    pub down: Vec<u32>,
}

impl DirectionalFrames {
    /// Walk cycle used by the party sheet (5x4 cells).
    #[must_use]
    pub fn walking() -> Self {
        Self {
            left: vec![10, 11, 12, 13],
            up: vec![15, 16, 17, 18],
            right: vec![10, 11, 12, 13],
            down: vec![0, 1, 2, 3],
        }
    }

    /// Frame list for a facing.
    #[must_use]
    pub fn frames(&self, facing: Direction) -> &[u32] {
        match facing {
            Direction::Left => &self.left,
            Direction::Up => &self.up,
            Direction::Right => &self.right,
            Direction::Down => &self.down,
        }
    }
}

/// Sprite-sheet animation state.
///
/// The core only tracks which frame is current; drawing belongs to the
/// renderer, which reads [`Animation::source_rect`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Frame lists per facing.
    pub frames: DirectionalFrames,
    /// Index into the current facing's frame list.
    pub frame_index: usize,
    /// Frames advanced per second.
    pub fps: f32,
    /// Time since the last frame change.
    pub accumulator: f32,
    /// Sheet columns.
    pub columns: u32,
    /// Sheet rows.
    pub rows: u32,
    /// Sheet size in pixels.
    pub sheet_size: Vec2,
}

impl Animation {
    /// Default frames per second.
    pub const DEFAULT_FPS: f32 = 14.0;

    /// Create an animation over a `columns` x `rows` sheet.
    #[must_use]
    pub fn new(frames: DirectionalFrames, columns: u32, rows: u32, sheet_size: Vec2) -> Self {
        Self {
            frames,
            frame_index: 0,
            fps: Self::DEFAULT_FPS,
            accumulator: 0.0,
            columns,
            rows,
            sheet_size,
        }
    }

    /// Builder method to set the frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Accumulate `dt` and step to the next frame of `facing`'s list once a
    /// frame's worth of time has passed.
    pub fn advance(&mut self, dt: f32, facing: Direction) {
        let len = self.frames.frames(facing).len();
        if len == 0 || self.fps <= 0.0 {
            return;
        }

        self.accumulator += dt;
        if self.accumulator >= 1.0 / self.fps {
            self.accumulator = 0.0;
            self.frame_index = (self.frame_index + 1) % len;
        }
    }

    /// Atlas cell currently shown for `facing`.
    #[must_use]
    pub fn current_frame(&self, facing: Direction) -> Option<u32> {
        let frames = self.frames.frames(facing);
        if frames.is_empty() {
            return None;
        }
        frames.get(self.frame_index % frames.len()).copied()
    }

    /// Source rectangle of the current frame inside the sheet.
    #[must_use]
    pub fn source_rect(&self, facing: Direction) -> Option<Rect> {
        self.current_frame(facing)
            .map(|cell| Rect::atlas_cell(self.sheet_size, self.columns, self.rows, cell))
    }
}
