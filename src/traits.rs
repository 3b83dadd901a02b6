//! Core traits that decouple xtiler from the windowing protocol and from
//! the transports that deliver events.
//!
//! Every concrete backend (X11, a Unix-socket listener, a test harness, …)
//! implements one of these traits.  The [`Engine`](crate::engine::Engine)
//! only depends on these abstractions.
//!
//! Window handles can become invalid at any moment (an application closes
//! while we are looking at it).  Query methods therefore return
//! `Ok(None)` for a vanished window, and requests addressed to one
//! succeed without effect; `Err` is reserved for failures of the
//! connection itself.

use crate::command::Event;
use crate::geometry::{Geometry, WorkArea};
use std::sync::mpsc;

/// Opaque window handle.
pub type WindowId = u32;

/// The subset of `_NET_WM_STATE` the engine cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowState {
    /// Dialog boxes; never tiled.
    pub modal: bool,
    /// Shown on all desktops; never tiled.
    pub sticky: bool,
    /// Minimized.
    pub hidden: bool,
}

/// Abstraction over the window system the engine arranges windows in.
///
/// An implementation might talk to an X server, or it might be an
/// in-memory stand-in used in tests.  Mutating requests may be buffered
/// until [`sync`](WindowManager::sync) is called.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// All managed top-level client windows.
    fn client_list(&self) -> Result<Vec<WindowId>, Self::Error>;

    /// The currently active window, if any.
    fn active_window(&self) -> Result<Option<WindowId>, Self::Error>;

    /// Index of the currently shown virtual desktop.
    fn current_desktop(&self) -> Result<u32, Self::Error>;

    /// Work area of `desktop` (screen minus reserved panel space).
    fn work_area(&self, desktop: u32) -> Result<WorkArea, Self::Error>;

    /// Application (class) name of the window.
    fn window_name(&self, window: WindowId) -> Result<Option<String>, Self::Error>;

    /// Human-readable window title.
    fn window_title(&self, window: WindowId) -> Result<Option<String>, Self::Error>;

    /// Virtual desktop the window lives on.
    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>, Self::Error>;

    /// Current state flags of the window.
    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>, Self::Error>;

    /// The top-most ancestor of `window` below the root, i.e. the frame
    /// a reparenting window manager wrapped it in (or the window itself).
    fn frame_of(&self, window: WindowId) -> Result<Option<WindowId>, Self::Error>;

    /// Geometry of `window` in root coordinates.
    fn geometry(&self, window: WindowId) -> Result<Option<Geometry>, Self::Error>;

    /// Whether the window draws its own decorations (client-side
    /// decoration).  Such windows are never re-decorated.
    fn has_client_side_decoration(&self, window: WindowId) -> Result<Option<bool>, Self::Error>;

    /// Whether the window manager currently decorates the window.
    fn is_decorated(&self, window: WindowId) -> Result<Option<bool>, Self::Error>;

    /// Move `window`.  `None` leaves that coordinate unchanged.
    fn set_position(&self, window: WindowId, x: Option<i32>, y: Option<i32>) -> Result<(), Self::Error>;

    /// Resize `window`.  `None` leaves that extent unchanged.
    fn set_size(&self, window: WindowId, width: Option<i32>, height: Option<i32>) -> Result<(), Self::Error>;

    /// Ask the window manager to show or hide the title bar.
    fn set_decoration(&self, window: WindowId, show: bool) -> Result<(), Self::Error>;

    /// Set or clear both native maximize flags.
    fn set_maximized(&self, window: WindowId, maximized: bool) -> Result<(), Self::Error>;

    /// Give input focus to the window.
    fn focus(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Raise the window to the top of the stacking order.
    fn raise(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Current pointer position in root coordinates.
    fn pointer_position(&self) -> Result<(i32, i32), Self::Error>;

    /// Move the pointer to root coordinates `(x, y)`.
    fn warp_pointer(&self, x: i32, y: i32) -> Result<(), Self::Error>;

    /// Flush buffered requests and wait until the server processed them.
    fn sync(&self) -> Result<(), Self::Error>;
}

//  Event Source

/// A source of [`Event`]s.
///
/// Implementations listen on some transport (the X event queue, a Unix
/// socket, an in-memory channel, …) and forward parsed events into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    ///
    /// This method blocks the calling thread.  To run multiple sources
    /// concurrently, spawn each one on its own thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}
