//! Integer window geometry.
//!
//! All border comparisons in xtiler use the *inclusive* bottom-right corner
//! (`x2`, `y2`), matching how X11 reports pixel extents.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position and size of a window (or of the work area) in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// The screen rectangle available for tiling, i.e. the screen minus panels.
pub type WorkArea = Geometry;

impl Geometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive right edge.
    pub const fn x2(&self) -> i32 {
        self.x + self.width - 1
    }

    /// Inclusive bottom edge.
    pub const fn y2(&self) -> i32 {
        self.y + self.height - 1
    }

    /// Center point, used when warping the pointer onto a window.
    pub const fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Whether the point lies inside the rectangle (edges included).
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px <= self.x2() && py >= self.y && py <= self.y2()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

bitflags! {
    /// Which borders of a window moved between two observations.
    ///
    /// The docked-resize propagation only acts when exactly one flag is set;
    /// a plain move changes two opposite borders at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MovedBorder: u8 {
        const LEFT = 1;
        const TOP = 2;
        const RIGHT = 4;
        const BOTTOM = 8;
    }
}

impl MovedBorder {
    /// Compare a recorded geometry with a freshly observed one.
    pub fn between(old: &Geometry, new: &Geometry) -> Self {
        let mut moved = Self::empty();
        if old.x != new.x {
            moved |= Self::LEFT;
        }
        if old.y != new.y {
            moved |= Self::TOP;
        }
        if old.x2() != new.x2() {
            moved |= Self::RIGHT;
        }
        if old.y2() != new.y2() {
            moved |= Self::BOTTOM;
        }
        moved
    }
}
