//! X11-specific implementations.
//!
//! This module provides concrete backends for the
//! [`WindowManager`](crate::traits::WindowManager) and
//! [`EventSource`](crate::traits::EventSource) traits on top of `x11rb`,
//! talking to an EWMH-compliant window manager.
//!
//! Nothing outside this module should reference X11 directly.

pub mod events;
pub mod wm;

use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::ErrorKind;

// Atoms used by both the window manager handle and the event source.
x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_ACTIVE_WINDOW,
        _NET_CLIENT_LIST,
        _NET_CURRENT_DESKTOP,
        _NET_WORKAREA,
        _NET_WM_DESKTOP,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_MODAL,
        _NET_WM_STATE_STICKY,
        _NET_WM_STATE_HIDDEN,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _GTK_FRAME_EXTENTS,
        _MOTIF_WM_HINTS,
        UTF8_STRING,
        _XTILER_REMOTE,
    }
}

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum X11WmError {
    #[error("cannot connect to the X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("X request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
}

/// Turn "the window is gone" protocol errors into `None`.
pub(crate) fn unless_vanished<T>(result: Result<T, ReplyError>) -> Result<Option<T>, X11WmError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(e))
            if matches!(
                e.error_kind,
                ErrorKind::Window | ErrorKind::Drawable | ErrorKind::Match
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
