//! Focus candidate selection.

use crate::command::Direction;
use crate::geometry::Geometry;
use crate::traits::WindowId;

/// Distance score of `candidate` seen from `active` in `direction`, or
/// `None` if it is not strictly on that side of the active window's origin.
///
/// The score is `2 * primary + orthogonal`, i.e. twice
/// `primary + orthogonal / 2` without rounding.
pub fn score(active: &Geometry, candidate: &Geometry, direction: Direction) -> Option<i64> {
    let dx = i64::from(candidate.x) - i64::from(active.x);
    let dy = i64::from(candidate.y) - i64::from(active.y);
    let (primary, orthogonal) = match direction {
        Direction::Left => (-dx, dy.abs()),
        Direction::Right => (dx, dy.abs()),
        Direction::Up => (-dy, dx.abs()),
        Direction::Down => (dy, dx.abs()),
    };
    (primary > 0).then_some(2 * primary + orthogonal)
}

/// The nearest candidate in `direction`; ties go to the first candidate.
pub fn pick_direction<'a>(
    active: &Geometry,
    candidates: impl IntoIterator<Item = (WindowId, &'a Geometry)>,
    direction: Direction,
) -> Option<WindowId> {
    let mut best: Option<(WindowId, i64)> = None;
    for (id, geometry) in candidates {
        let Some(s) = score(active, geometry, direction) else {
            continue;
        };
        if best.map_or(true, |(_, b)| s < b) {
            best = Some((id, s));
        }
    }
    best.map(|(id, _)| id)
}

/// The most recently focused candidate.  Windows that were never focused
/// (`0`) are not considered.
pub fn pick_previous(candidates: impl IntoIterator<Item = (WindowId, u64)>) -> Option<WindowId> {
    let mut best: Option<(WindowId, u64)> = None;
    for (id, at) in candidates {
        if at > 0 && best.map_or(true, |(_, b)| at > b) {
            best = Some((id, at));
        }
    }
    best.map(|(id, _)| id)
}
