//! **xtiler**: a tiling add-on for stacking X11 window managers.
//!
//! xtiler does not manage windows itself.  It watches the windows an
//! EWMH-compliant window manager already manages and arranges the ones on
//! each virtual desktop with one of five tilers (master-and-stack in two
//! orientations, plain vertical/horizontal stacks, maximize).  When the
//! user drags a border of a window, windows docked to that border follow.
//! Hotkeys and a remote-control channel switch tilers, move the focus and
//! toggle behaviour per desktop.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::WindowManager`]: queries and moves windows, so the tiling
//!   logic is not coupled to the X protocol.
//! * [`traits::EventSource`]: abstracts the transport that delivers events
//!   (the X event queue, a Unix socket, …) so the main loop is not coupled
//!   to any specific mechanism.
//!
//! [`engine::Engine`] owns all state and reacts to one [`command::Event`]
//! at a time.  Layout, docking and focus selection are pure functions in
//! [`layout`], [`docking`] and [`focus`].  Concrete backends live in `x11`
//! (behind the default `x11` feature) and [`ipc`].

pub mod command;
pub mod config;
pub mod desktop;
pub mod docking;
pub mod engine;
pub mod focus;
pub mod geometry;
pub mod ipc;
pub mod journal;
pub mod layout;
pub mod registry;
pub mod rules;
pub mod traits;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(test)]
pub(crate) mod testing;
