//! In-memory [`WindowManager`] used by the unit tests.
//!
//! Geometry writes are applied immediately, so a reconciliation after a
//! layout observes exactly what the layout wrote.  Every mutating call is
//! also recorded for order/occurrence assertions.

use crate::geometry::{Geometry, WorkArea};
use crate::traits::{WindowId, WindowManager, WindowState};
use std::cell::{Cell, RefCell};

/// How far off a position written to a non-addressable frame lands.
pub const FRAME_SKEW: i32 = 24;

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub id: WindowId,
    pub frame: WindowId,
    pub name: Option<String>,
    pub title: Option<String>,
    pub desktop: u32,
    pub geometry: Geometry,
    pub state: WindowState,
    pub csd: bool,
    pub decorated: bool,
    pub maximized: bool,
    /// When false, positions written to the frame land [`FRAME_SKEW`]
    /// pixels too low; only the client window itself positions correctly.
    pub frame_addressable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Position(WindowId, Option<i32>, Option<i32>),
    Size(WindowId, Option<i32>, Option<i32>),
    Decoration(WindowId, bool),
    Maximized(WindowId, bool),
    Focus(WindowId),
    Raise(WindowId),
    Warp(i32, i32),
    Sync,
}

#[derive(Debug, thiserror::Error)]
#[error("fake connection lost")]
pub struct FakeError;

pub struct FakeWm {
    windows: RefCell<Vec<FakeWindow>>,
    pub calls: RefCell<Vec<Call>>,
    pub active: Cell<Option<WindowId>>,
    pub desktop: Cell<u32>,
    pub work_area: Cell<WorkArea>,
    pub pointer: Cell<(i32, i32)>,
    pub broken: Cell<bool>,
}

impl FakeWm {
    pub fn new() -> Self {
        Self {
            windows: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            active: Cell::new(None),
            desktop: Cell::new(0),
            work_area: Cell::new(Geometry::new(0, 0, 1920, 1080)),
            pointer: Cell::new((0, 0)),
            broken: Cell::new(false),
        }
    }

    pub fn add_window(&self, id: WindowId, name: &str, geometry: Geometry) {
        self.add_framed_window(id, id, name, geometry);
    }

    pub fn add_framed_window(&self, id: WindowId, frame: WindowId, name: &str, geometry: Geometry) {
        self.windows.borrow_mut().push(FakeWindow {
            id,
            frame,
            name: Some(name.to_string()),
            title: Some(format!("{} window", name)),
            desktop: 0,
            geometry,
            state: WindowState::default(),
            csd: false,
            decorated: true,
            maximized: false,
            frame_addressable: true,
        });
    }

    pub fn remove_window(&self, id: WindowId) {
        self.windows.borrow_mut().retain(|w| w.id != id);
    }

    /// Mutate a window in place.
    pub fn edit(&self, id: WindowId, f: impl FnOnce(&mut FakeWindow)) {
        if let Some(w) = self.windows.borrow_mut().iter_mut().find(|w| w.id == id) {
            f(w);
        }
    }

    pub fn window(&self, id: WindowId) -> FakeWindow {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no fake window {}", id))
    }

    pub fn geometry_of(&self, id: WindowId) -> Geometry {
        self.window(id).geometry
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn lookup<T>(&self, handle: WindowId, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.windows
            .borrow()
            .iter()
            .find(|w| w.id == handle || w.frame == handle)
            .map(f)
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl WindowManager for FakeWm {
    type Error = FakeError;

    fn client_list(&self) -> Result<Vec<WindowId>, FakeError> {
        if self.broken.get() {
            return Err(FakeError);
        }
        Ok(self.windows.borrow().iter().map(|w| w.id).collect())
    }

    fn active_window(&self) -> Result<Option<WindowId>, FakeError> {
        Ok(self.active.get())
    }

    fn current_desktop(&self) -> Result<u32, FakeError> {
        Ok(self.desktop.get())
    }

    fn work_area(&self, _desktop: u32) -> Result<WorkArea, FakeError> {
        Ok(self.work_area.get())
    }

    fn window_name(&self, window: WindowId) -> Result<Option<String>, FakeError> {
        Ok(self.lookup(window, |w| w.name.clone()).flatten())
    }

    fn window_title(&self, window: WindowId) -> Result<Option<String>, FakeError> {
        Ok(self.lookup(window, |w| w.title.clone()).flatten())
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>, FakeError> {
        Ok(self.lookup(window, |w| w.desktop))
    }

    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>, FakeError> {
        Ok(self.lookup(window, |w| w.state))
    }

    fn frame_of(&self, window: WindowId) -> Result<Option<WindowId>, FakeError> {
        Ok(self.lookup(window, |w| w.frame))
    }

    fn geometry(&self, window: WindowId) -> Result<Option<Geometry>, FakeError> {
        Ok(self.lookup(window, |w| w.geometry))
    }

    fn has_client_side_decoration(&self, window: WindowId) -> Result<Option<bool>, FakeError> {
        Ok(self.lookup(window, |w| w.csd))
    }

    fn is_decorated(&self, window: WindowId) -> Result<Option<bool>, FakeError> {
        Ok(self.lookup(window, |w| w.decorated))
    }

    fn set_position(&self, window: WindowId, x: Option<i32>, y: Option<i32>) -> Result<(), FakeError> {
        self.record(Call::Position(window, x, y));
        let mut windows = self.windows.borrow_mut();
        if let Some(w) = windows.iter_mut().find(|w| w.id == window || w.frame == window) {
            let via_frame = window == w.frame && w.frame != w.id;
            let skew = if via_frame && !w.frame_addressable {
                FRAME_SKEW
            } else {
                0
            };
            if let Some(x) = x {
                w.geometry.x = x;
            }
            if let Some(y) = y {
                w.geometry.y = y + skew;
            }
        }
        Ok(())
    }

    fn set_size(&self, window: WindowId, width: Option<i32>, height: Option<i32>) -> Result<(), FakeError> {
        self.record(Call::Size(window, width, height));
        let mut windows = self.windows.borrow_mut();
        if let Some(w) = windows.iter_mut().find(|w| w.id == window || w.frame == window) {
            if let Some(width) = width {
                w.geometry.width = width;
            }
            if let Some(height) = height {
                w.geometry.height = height;
            }
        }
        Ok(())
    }

    fn set_decoration(&self, window: WindowId, show: bool) -> Result<(), FakeError> {
        self.record(Call::Decoration(window, show));
        self.edit(window, |w| w.decorated = show);
        Ok(())
    }

    fn set_maximized(&self, window: WindowId, maximized: bool) -> Result<(), FakeError> {
        self.record(Call::Maximized(window, maximized));
        self.edit(window, |w| w.maximized = maximized);
        Ok(())
    }

    fn focus(&self, window: WindowId) -> Result<(), FakeError> {
        self.record(Call::Focus(window));
        self.active.set(Some(window));
        Ok(())
    }

    fn raise(&self, window: WindowId) -> Result<(), FakeError> {
        self.record(Call::Raise(window));
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), FakeError> {
        Ok(self.pointer.get())
    }

    fn warp_pointer(&self, x: i32, y: i32) -> Result<(), FakeError> {
        self.record(Call::Warp(x, y));
        self.pointer.set((x, y));
        Ok(())
    }

    fn sync(&self) -> Result<(), FakeError> {
        self.record(Call::Sync);
        Ok(())
    }
}
