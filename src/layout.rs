//! Placement planners for the stacking tilers.
//!
//! The planners are pure: they receive the participating windows with
//! their recorded geometry and the work area, and return a [`Plan`].  The
//! [`Engine`](crate::engine::Engine) applies the plan through the window
//! manager (un-maximize, position, size, decoration) and reconciles.
//!
//! Shares along the stack axis are integer divisions of the work-area
//! extent; the last window's share is `extent - offset + 1`, absorbing the
//! rounding remainder (and overlapping the work-area edge by one pixel,
//! which window managers clamp).

use crate::geometry::{Geometry, MovedBorder, WorkArea};
use crate::traits::WindowId;

/// An axis of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left to right.
    X,
    /// Top to bottom.
    Y,
}

impl Axis {
    pub fn cross(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    fn start(self, g: &Geometry) -> i32 {
        match self {
            Axis::X => g.x,
            Axis::Y => g.y,
        }
    }

    fn end(self, g: &Geometry) -> i32 {
        match self {
            Axis::X => g.x2(),
            Axis::Y => g.y2(),
        }
    }

    fn extent(self, g: &Geometry) -> i32 {
        match self {
            Axis::X => g.width,
            Axis::Y => g.height,
        }
    }

    /// Build a rectangle from a span on this axis and a span on the cross
    /// axis.
    fn rect(self, start: i32, len: i32, cross_start: i32, cross_len: i32) -> Geometry {
        match self {
            Axis::X => Geometry::new(start, cross_start, len, cross_len),
            Axis::Y => Geometry::new(cross_start, start, cross_len, len),
        }
    }

    /// The border on the far side of this axis.
    pub fn far_border(self) -> MovedBorder {
        match self {
            Axis::X => MovedBorder::RIGHT,
            Axis::Y => MovedBorder::BOTTOM,
        }
    }
}

/// A window and the geometry it should get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub window: WindowId,
    pub geometry: Geometry,
}

/// What a tiler wants done with one desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// No participating windows.
    Empty,
    /// Exactly one window; `fill` is the work area when it should be
    /// maximized, `None` when it keeps its geometry.
    Single {
        window: WindowId,
        fill: Option<Geometry>,
    },
    /// Regular layout.  `overflow` are the windows beyond the tiler's
    /// maximum count; they are not moved.
    Tiled {
        placements: Vec<Placement>,
        overflow: Vec<WindowId>,
    },
    /// The master sits in its natural position and only its far border
    /// moves; the stack follows through docked-resize propagation.
    ResizeMaster {
        window: WindowId,
        from: Geometry,
        to: Geometry,
        border: MovedBorder,
    },
}

/// Master-stack parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterParams {
    pub max_windows: usize,
    /// Share of the work area the master gets when (re)placed.
    pub fraction: f64,
    pub min_size: i32,
    /// Change of the master extent requested by shrink/enlarge-master.
    pub resize: i32,
}

fn single(windows: &[(WindowId, Geometry)], work_area: &WorkArea, maximize: bool) -> Option<Plan> {
    match windows {
        [] => Some(Plan::Empty),
        [(window, _)] => Some(Plan::Single {
            window: *window,
            fill: maximize.then_some(*work_area),
        }),
        _ => None,
    }
}

/// Divide `[start, start + extent)` of `axis` into `n` shares and place
/// `windows` in order; every window spans `cross` fully.
fn divide(
    windows: &[(WindowId, Geometry)],
    axis: Axis,
    start: i32,
    extent: i32,
    cross_start: i32,
    cross_len: i32,
) -> Vec<Placement> {
    let n = windows.len() as i32;
    if n == 0 {
        return Vec::new();
    }
    let share = extent / n;
    let mut offset = 0;
    windows
        .iter()
        .enumerate()
        .map(|(i, (window, _))| {
            let len = if i as i32 == n - 1 {
                extent - offset + 1
            } else {
                share
            };
            let geometry = axis.rect(start + offset, len, cross_start, cross_len);
            offset += len;
            Placement {
                window: *window,
                geometry,
            }
        })
        .collect()
}

/// Stack windows along `axis` (`Axis::Y`: one above the other, each full
/// width; `Axis::X`: side by side, each full height), ordered by their
/// current position along that axis.
pub fn stack(
    windows: &[(WindowId, Geometry)],
    work_area: &WorkArea,
    axis: Axis,
    max_windows: usize,
    maximize_single: bool,
) -> Plan {
    if let Some(plan) = single(windows, work_area, maximize_single) {
        return plan;
    }

    let mut sorted = windows.to_vec();
    sorted.sort_by_key(|(_, g)| axis.start(g));
    let n = max_windows.max(1).min(sorted.len());
    let overflow = sorted[n..].iter().map(|(id, _)| *id).collect();

    let cross = axis.cross();
    let placements = divide(
        &sorted[..n],
        axis,
        axis.start(work_area),
        axis.extent(work_area),
        cross.start(work_area),
        cross.extent(work_area),
    );
    Plan::Tiled {
        placements,
        overflow,
    }
}

/// One master window at the start of `primary` plus a stack of the
/// remaining windows along the cross axis in the rest of the work area.
///
/// `Axis::X` puts the master on the left with the stack on the right,
/// `Axis::Y` puts it on top with the stack below.
pub fn master_stack(
    windows: &[(WindowId, Geometry)],
    work_area: &WorkArea,
    primary: Axis,
    params: MasterParams,
    maximize_single: bool,
) -> Plan {
    if let Some(plan) = single(windows, work_area, maximize_single) {
        return plan;
    }

    let cross = primary.cross();
    let mut sorted = windows.to_vec();
    sorted.sort_by_key(|(_, g)| primary.start(g));
    sorted[1..].sort_by_key(|(_, g)| cross.start(g));

    let (master, current) = sorted[0];
    let origin = primary.start(work_area);
    let extent = primary.extent(work_area);
    let cross_origin = cross.start(work_area);
    let cross_extent = cross.extent(work_area);

    let far = primary.end(&current) - origin;
    let natural = primary.start(&current) == origin
        && cross.start(&current) == cross_origin
        && cross.end(&current) == cross_origin + cross_extent - 1
        && params.min_size < far
        && far < extent - params.min_size;

    let mut placements = Vec::new();
    let master_len = if natural {
        let len = primary.extent(&current);
        if params.resize != 0 {
            let resized = (len + params.resize)
                .max(params.min_size + 2)
                .min(extent - params.min_size);
            return Plan::ResizeMaster {
                window: master,
                from: current,
                to: primary.rect(origin, resized, cross_origin, cross_extent),
                border: primary.far_border(),
            };
        }
        len
    } else {
        let len = (extent as f64 * params.fraction) as i32;
        placements.push(Placement {
            window: master,
            geometry: primary.rect(origin, len, cross_origin, cross_extent),
        });
        len
    };

    let rest = &sorted[1..];
    let n = params.max_windows.saturating_sub(1).min(rest.len());
    let overflow = rest[n..].iter().map(|(id, _)| *id).collect();

    // The stack is laid out along the cross axis; every stacked window
    // covers the primary extent the master leaves free.
    placements.extend(divide(
        &rest[..n],
        cross,
        cross_origin,
        cross_extent,
        origin + master_len,
        extent - master_len,
    ));

    Plan::Tiled {
        placements,
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WA: Geometry = Geometry::new(0, 0, 1920, 1080);

    fn params() -> MasterParams {
        MasterParams {
            max_windows: 3,
            fraction: 0.5,
            min_size: 350,
            resize: 0,
        }
    }

    fn tiled(plan: Plan) -> (Vec<Placement>, Vec<WindowId>) {
        match plan {
            Plan::Tiled {
                placements,
                overflow,
            } => (placements, overflow),
            other => panic!("expected a tiled plan, got {:?}", other),
        }
    }

    fn geometries(placements: &[Placement]) -> Vec<(WindowId, Geometry)> {
        placements.iter().map(|p| (p.window, p.geometry)).collect()
    }

    #[test]
    fn master_stack_vertical_three_windows() {
        let windows = [
            (1, Geometry::new(100, 100, 500, 500)),
            (2, Geometry::new(300, 50, 500, 500)),
            (3, Geometry::new(700, 10, 500, 500)),
        ];
        let (placements, overflow) = tiled(master_stack(&windows, &WA, Axis::X, params(), true));
        assert!(overflow.is_empty());
        assert_eq!(
            geometries(&placements),
            vec![
                (1, Geometry::new(0, 0, 960, 1080)),
                (3, Geometry::new(960, 0, 960, 540)),
                (2, Geometry::new(960, 540, 960, 541)),
            ]
        );
    }

    #[test]
    fn natural_master_is_left_alone() {
        let windows = [
            (1, Geometry::new(0, 0, 800, 1080)),
            (2, Geometry::new(900, 0, 500, 500)),
        ];
        let (placements, _) = tiled(master_stack(&windows, &WA, Axis::X, params(), true));
        assert_eq!(
            geometries(&placements),
            vec![(2, Geometry::new(800, 0, 1120, 1081))]
        );
    }

    #[test]
    fn master_too_wide_is_replaced() {
        // x2 = 1599 leaves less than min_size for the stack.
        let windows = [
            (1, Geometry::new(0, 0, 1600, 1080)),
            (2, Geometry::new(1600, 0, 320, 1080)),
        ];
        let (placements, _) = tiled(master_stack(&windows, &WA, Axis::X, params(), true));
        assert_eq!(placements[0].geometry, Geometry::new(0, 0, 960, 1080));
    }

    #[test]
    fn master_stack_is_idempotent() {
        let windows = [
            (1, Geometry::new(100, 100, 500, 500)),
            (2, Geometry::new(300, 50, 500, 500)),
            (3, Geometry::new(700, 10, 500, 500)),
        ];
        let (first, _) = tiled(master_stack(&windows, &WA, Axis::X, params(), true));
        let mut after: Vec<(WindowId, Geometry)> = windows.to_vec();
        for p in &first {
            if let Some(w) = after.iter_mut().find(|(id, _)| *id == p.window) {
                w.1 = p.geometry;
            }
        }
        let (second, _) = tiled(master_stack(&after, &WA, Axis::X, params(), true));
        for p in &second {
            let (_, g) = after.iter().find(|(id, _)| *id == p.window).unwrap();
            assert_eq!(*g, p.geometry);
        }
    }

    #[test]
    fn master_stack_horizontal() {
        let windows = [
            (1, Geometry::new(0, 0, 500, 500)),
            (2, Geometry::new(600, 600, 500, 400)),
            (3, Geometry::new(100, 700, 500, 300)),
        ];
        let (placements, _) = tiled(master_stack(&windows, &WA, Axis::Y, params(), true));
        assert_eq!(
            geometries(&placements),
            vec![
                (1, Geometry::new(0, 0, 1920, 540)),
                (3, Geometry::new(0, 540, 960, 540)),
                (2, Geometry::new(960, 540, 961, 540)),
            ]
        );
    }

    #[test]
    fn resize_master_clamps_and_targets_far_border() {
        let windows = [
            (1, Geometry::new(0, 0, 960, 1080)),
            (2, Geometry::new(960, 0, 960, 1080)),
        ];
        let mut p = params();
        p.resize = 50;
        match master_stack(&windows, &WA, Axis::X, p, true) {
            Plan::ResizeMaster {
                window,
                from,
                to,
                border,
            } => {
                assert_eq!(window, 1);
                assert_eq!(from, windows[0].1);
                assert_eq!(to, Geometry::new(0, 0, 1010, 1080));
                assert_eq!(border, MovedBorder::RIGHT);
            }
            other => panic!("unexpected plan {:?}", other),
        }

        p.resize = 10_000;
        match master_stack(&windows, &WA, Axis::X, p, true) {
            Plan::ResizeMaster { to, .. } => assert_eq!(to.width, 1920 - 350),
            other => panic!("unexpected plan {:?}", other),
        }

        p.resize = -10_000;
        match master_stack(&windows, &WA, Axis::X, p, true) {
            Plan::ResizeMaster { to, .. } => assert_eq!(to.width, 352),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn resize_of_displaced_master_uses_fraction() {
        let windows = [
            (1, Geometry::new(20, 0, 960, 1080)),
            (2, Geometry::new(960, 0, 960, 1080)),
        ];
        let mut p = params();
        p.resize = 50;
        let (placements, _) = tiled(master_stack(&windows, &WA, Axis::X, p, true));
        assert_eq!(placements[0].geometry, Geometry::new(0, 0, 960, 1080));
    }

    #[test]
    fn stack_vertical_divides_height() {
        let windows = [
            (1, Geometry::new(0, 500, 100, 100)),
            (2, Geometry::new(0, 0, 100, 100)),
        ];
        let (placements, _) = tiled(stack(&windows, &WA, Axis::Y, 3, true));
        assert_eq!(
            geometries(&placements),
            vec![
                (2, Geometry::new(0, 0, 1920, 540)),
                (1, Geometry::new(0, 540, 1920, 541)),
            ]
        );
    }

    #[test]
    fn stack_horizontal_respects_work_area_origin() {
        let wa = Geometry::new(50, 30, 1000, 600);
        let windows = [
            (1, Geometry::new(400, 0, 100, 100)),
            (2, Geometry::new(0, 0, 100, 100)),
            (3, Geometry::new(200, 0, 100, 100)),
        ];
        let (placements, _) = tiled(stack(&windows, &wa, Axis::X, 3, true));
        assert_eq!(
            geometries(&placements),
            vec![
                (2, Geometry::new(50, 30, 333, 600)),
                (3, Geometry::new(383, 30, 333, 600)),
                (1, Geometry::new(716, 30, 335, 600)),
            ]
        );
    }

    #[test]
    fn windows_beyond_max_overflow() {
        let windows: Vec<_> = (1..=5)
            .map(|i| (i, Geometry::new(i as i32 * 100, 0, 100, 100)))
            .collect();
        let (placements, overflow) = tiled(stack(&windows, &WA, Axis::X, 3, true));
        assert_eq!(placements.len(), 3);
        assert_eq!(overflow, vec![4, 5]);

        let (placements, overflow) = tiled(master_stack(&windows, &WA, Axis::X, params(), true));
        assert_eq!(placements.len(), 3);
        assert_eq!(overflow, vec![4, 5]);
    }

    #[test]
    fn empty_and_single() {
        assert_eq!(stack(&[], &WA, Axis::X, 3, true), Plan::Empty);
        let one = [(7, Geometry::new(10, 10, 100, 100))];
        assert_eq!(
            stack(&one, &WA, Axis::X, 3, true),
            Plan::Single {
                window: 7,
                fill: Some(WA)
            }
        );
        assert_eq!(
            master_stack(&one, &WA, Axis::X, params(), false),
            Plan::Single {
                window: 7,
                fill: None
            }
        );
    }
}
