//! Docked-border resize propagation.
//!
//! Windows are never linked explicitly.  Whether a neighbour was docked to
//! the border the user dragged is re-derived from coordinates every time:
//! its facing edge was within `margin + tolerance` pixels of the active
//! window's border *before* the drag, and the two windows overlapped on the
//! cross axis (clamped to the work area).

use crate::geometry::{Geometry, MovedBorder, WorkArea};
use crate::traits::WindowId;

/// New position and size for a neighbour; `None` fields stay unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub window: WindowId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Thresholds for the adjacency test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Docking {
    /// Largest gap between two windows that still counts as docked.
    pub margin: i32,
    /// Slack added to every comparison.
    pub tolerance: i32,
    /// A neighbour is never shrunk below this extent.
    pub min_size: i32,
}

impl Docking {
    /// Whether `other` was docked to `border` of the active window at its
    /// pre-drag geometry `active`.
    pub fn was_docked(
        &self,
        border: MovedBorder,
        active: &Geometry,
        other: &Geometry,
        work_area: &WorkArea,
    ) -> bool {
        let reach = self.margin + self.tolerance;
        let tol = self.tolerance;
        let overlaps_vertically = active.y <= other.y.max(work_area.y) + tol
            && active.y2() >= other.y2().min(work_area.y + work_area.height) - tol;
        let overlaps_horizontally = active.x <= other.x.max(work_area.x) + tol
            && active.x2() >= other.x2().min(work_area.x + work_area.width) - tol;

        if border == MovedBorder::LEFT {
            (other.x2() + 1 - active.x).abs() <= reach && overlaps_vertically
        } else if border == MovedBorder::TOP {
            (other.y2() + 1 - active.y).abs() <= reach && overlaps_horizontally
        } else if border == MovedBorder::RIGHT {
            (active.x2() + 1 - other.x).abs() <= reach && overlaps_vertically
        } else if border == MovedBorder::BOTTOM {
            (active.y2() + 1 - other.y).abs() <= reach && overlaps_horizontally
        } else {
            false
        }
    }

    /// How `other` has to change so its facing edge meets the active
    /// window's new border.  `None` if it was not docked or would end up
    /// smaller than `min_size`.
    pub fn adjust(
        &self,
        border: MovedBorder,
        active_before: &Geometry,
        active_now: &Geometry,
        window: WindowId,
        other: &Geometry,
        work_area: &WorkArea,
    ) -> Option<Adjustment> {
        if !self.was_docked(border, active_before, other, work_area) {
            return None;
        }
        let none = Adjustment {
            window,
            x: None,
            y: None,
            width: None,
            height: None,
        };
        if border == MovedBorder::LEFT {
            let width = active_now.x - other.x;
            (width >= self.min_size).then_some(Adjustment {
                width: Some(width),
                ..none
            })
        } else if border == MovedBorder::TOP {
            let height = active_now.y - other.y;
            (height >= self.min_size).then_some(Adjustment {
                height: Some(height),
                ..none
            })
        } else if border == MovedBorder::RIGHT {
            let width = other.x2() - active_now.x2();
            (width >= self.min_size).then_some(Adjustment {
                x: Some(active_now.x2() + 1),
                width: Some(width),
                ..none
            })
        } else if border == MovedBorder::BOTTOM {
            let height = other.y2() - active_now.y2();
            (height >= self.min_size).then_some(Adjustment {
                y: Some(active_now.y2() + 1),
                height: Some(height),
                ..none
            })
        } else {
            None
        }
    }

    /// Adjustments for every neighbour in `others`.  Nothing happens unless
    /// exactly one border moved.
    pub fn propagate(
        &self,
        border: MovedBorder,
        active_before: &Geometry,
        active_now: &Geometry,
        others: &[(WindowId, Geometry)],
        work_area: &WorkArea,
    ) -> Vec<Adjustment> {
        if border.bits().count_ones() != 1 {
            return Vec::new();
        }
        others
            .iter()
            .filter_map(|(id, g)| self.adjust(border, active_before, active_now, *id, g, work_area))
            .collect()
    }
}
