//! [`WindowManager`] implementation backed by an X11 connection.
//!
//! All state is read from EWMH properties on the root window and on the
//! client windows; mutations are plain `ConfigureWindow` requests, Motif
//! hints for decoration and `_NET_WM_STATE` client messages for the
//! maximize flags.  Requests are buffered until [`sync`](WindowManager::sync).

use super::{unless_vanished, Atoms, X11WmError};
use crate::geometry::{Geometry, WorkArea};
use crate::traits::{WindowId, WindowManager, WindowState};
use log::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
    InputFocus, PropMode, StackMode, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

/// `flags` bit of `_MOTIF_WM_HINTS` saying the `decorations` field is set.
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;
/// Source indication "normal application" for EWMH client messages.
const SOURCE_APPLICATION: u32 = 1;

/// X11-backed window manager handle.
pub struct X11Wm {
    conn: RustConnection,
    root: Window,
    screen_size: (u16, u16),
    atoms: Atoms,
}

impl X11Wm {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, X11WmError> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let screen_size = (screen.width_in_pixels, screen.height_in_pixels);
        let atoms = Atoms::new(&conn)?.reply()?;
        debug!(
            "connected to X11 screen {}, root 0x{:x}, {}x{}",
            screen_num, root, screen_size.0, screen_size.1
        );
        Ok(Self {
            conn,
            root,
            screen_size,
            atoms,
        })
    }

    /// Raw property value.  `None` if the window vanished; a missing
    /// property reads as empty.
    fn property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
    ) -> Result<Option<(u8, Vec<u8>)>, X11WmError> {
        let cookie = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX / 4)?;
        Ok(unless_vanished(cookie.reply())?.map(|reply| (reply.format, reply.value)))
    }

    /// 32-bit property values (atoms, windows, cardinals).
    fn property32(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
    ) -> Result<Option<Vec<u32>>, X11WmError> {
        Ok(self
            .property(window, property, type_)?
            .map(|(format, value)| if format == 32 { values32(&value) } else { Vec::new() }))
    }

    fn root_property32(&self, property: Atom, type_: impl Into<Atom>) -> Result<Vec<u32>, X11WmError> {
        Ok(self.property32(self.root, property, type_)?.unwrap_or_default())
    }

    /// Send an EWMH client message about `window` to the root window.
    fn send_root_message(&self, window: Window, type_: Atom, data: [u32; 5]) -> Result<(), X11WmError> {
        let event = ClientMessageEvent::new(32, window, type_, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        Ok(())
    }
}

/// Decode a format-32 property value in native byte order.
fn values32(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// `WM_CLASS` holds `instance\0class\0`; the class is the application name.
fn class_name(bytes: &[u8]) -> Option<String> {
    let mut parts = bytes
        .split(|b| *b == 0)
        .filter(|p| !p.is_empty())
        .map(|p| String::from_utf8_lossy(p).into_owned());
    let instance = parts.next()?;
    Some(parts.next().unwrap_or(instance))
}

/// Whether the Motif hints leave the title bar on.
fn motif_decorated(hints: &[u32]) -> bool {
    match hints {
        [flags, _, decorations, ..] if flags & MWM_HINTS_DECORATIONS != 0 => *decorations != 0,
        _ => true,
    }
}

/// Entry `desktop` of `_NET_WORKAREA` (x, y, width, height per desktop).
/// Window managers that publish a single entry use it for all desktops.
fn work_area_entry(values: &[u32], desktop: u32) -> Option<Geometry> {
    let entries: Vec<&[u32]> = values.chunks_exact(4).collect();
    let entry = entries
        .get(desktop as usize)
        .or_else(|| entries.first())?;
    Some(Geometry::new(
        entry[0] as i32,
        entry[1] as i32,
        entry[2] as i32,
        entry[3] as i32,
    ))
}

fn state_from(values: &[u32], atoms: &Atoms) -> WindowState {
    WindowState {
        modal: values.contains(&atoms._NET_WM_STATE_MODAL),
        sticky: values.contains(&atoms._NET_WM_STATE_STICKY),
        hidden: values.contains(&atoms._NET_WM_STATE_HIDDEN),
    }
}

//  WindowManager implementation

impl WindowManager for X11Wm {
    type Error = X11WmError;

    fn client_list(&self) -> Result<Vec<WindowId>, Self::Error> {
        self.root_property32(self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)
    }

    fn active_window(&self) -> Result<Option<WindowId>, Self::Error> {
        let values = self.root_property32(self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)?;
        Ok(values.first().copied().filter(|w| *w != x11rb::NONE))
    }

    fn current_desktop(&self) -> Result<u32, Self::Error> {
        let values = self.root_property32(self.atoms._NET_CURRENT_DESKTOP, AtomEnum::CARDINAL)?;
        Ok(values.first().copied().unwrap_or(0))
    }

    fn work_area(&self, desktop: u32) -> Result<WorkArea, Self::Error> {
        let values = self.root_property32(self.atoms._NET_WORKAREA, AtomEnum::CARDINAL)?;
        Ok(work_area_entry(&values, desktop).unwrap_or_else(|| {
            Geometry::new(0, 0, i32::from(self.screen_size.0), i32::from(self.screen_size.1))
        }))
    }

    fn window_name(&self, window: WindowId) -> Result<Option<String>, Self::Error> {
        Ok(self
            .property(window, AtomEnum::WM_CLASS, AtomEnum::STRING)?
            .and_then(|(_, value)| class_name(&value)))
    }

    fn window_title(&self, window: WindowId) -> Result<Option<String>, Self::Error> {
        let Some((_, value)) = self.property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)? else {
            return Ok(None);
        };
        if !value.is_empty() {
            return Ok(Some(String::from_utf8_lossy(&value).into_owned()));
        }
        Ok(self
            .property(window, AtomEnum::WM_NAME, AtomEnum::STRING)?
            .map(|(_, value)| String::from_utf8_lossy(&value).into_owned())
            .filter(|t| !t.is_empty()))
    }

    fn window_desktop(&self, window: WindowId) -> Result<Option<u32>, Self::Error> {
        Ok(self
            .property32(window, self.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL)?
            .and_then(|v| v.first().copied()))
    }

    fn window_state(&self, window: WindowId) -> Result<Option<WindowState>, Self::Error> {
        Ok(self
            .property32(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM)?
            .map(|v| state_from(&v, &self.atoms)))
    }

    fn frame_of(&self, window: WindowId) -> Result<Option<WindowId>, Self::Error> {
        let mut current = window;
        loop {
            let Some(tree) = unless_vanished(self.conn.query_tree(current)?.reply())? else {
                return Ok(None);
            };
            if tree.parent == tree.root || tree.parent == x11rb::NONE {
                return Ok(Some(current));
            }
            current = tree.parent;
        }
    }

    fn geometry(&self, window: WindowId) -> Result<Option<Geometry>, Self::Error> {
        let Some(geometry) = unless_vanished(self.conn.get_geometry(window)?.reply())? else {
            return Ok(None);
        };
        let Some(origin) =
            unless_vanished(self.conn.translate_coordinates(window, self.root, 0, 0)?.reply())?
        else {
            return Ok(None);
        };
        Ok(Some(Geometry::new(
            i32::from(origin.dst_x),
            i32::from(origin.dst_y),
            i32::from(geometry.width),
            i32::from(geometry.height),
        )))
    }

    fn has_client_side_decoration(&self, window: WindowId) -> Result<Option<bool>, Self::Error> {
        Ok(self
            .property(window, self.atoms._GTK_FRAME_EXTENTS, AtomEnum::CARDINAL)?
            .map(|(_, value)| !value.is_empty()))
    }

    fn is_decorated(&self, window: WindowId) -> Result<Option<bool>, Self::Error> {
        Ok(self
            .property32(window, self.atoms._MOTIF_WM_HINTS, self.atoms._MOTIF_WM_HINTS)?
            .map(|hints| motif_decorated(&hints)))
    }

    fn set_position(&self, window: WindowId, x: Option<i32>, y: Option<i32>) -> Result<(), Self::Error> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn set_size(&self, window: WindowId, width: Option<i32>, height: Option<i32>) -> Result<(), Self::Error> {
        let extent = |v: i32| v.max(1) as u32;
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .width(width.map(extent))
                .height(height.map(extent)),
        )?;
        Ok(())
    }

    fn set_decoration(&self, window: WindowId, show: bool) -> Result<(), Self::Error> {
        let hints = [MWM_HINTS_DECORATIONS, 0, u32::from(show), 0, 0];
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms._MOTIF_WM_HINTS,
            self.atoms._MOTIF_WM_HINTS,
            &hints,
        )?;
        Ok(())
    }

    fn set_maximized(&self, window: WindowId, maximized: bool) -> Result<(), Self::Error> {
        let action = if maximized {
            NET_WM_STATE_ADD
        } else {
            NET_WM_STATE_REMOVE
        };
        self.send_root_message(
            window,
            self.atoms._NET_WM_STATE,
            [
                action,
                self.atoms._NET_WM_STATE_MAXIMIZED_VERT,
                self.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
                SOURCE_APPLICATION,
                0,
            ],
        )
    }

    fn focus(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn
            .set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn raise(&self, window: WindowId) -> Result<(), Self::Error> {
        let target = self.frame_of(window)?.unwrap_or(window);
        self.conn.configure_window(
            target,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), Self::Error> {
        let pointer = self.conn.query_pointer(self.root)?.reply()?;
        Ok((i32::from(pointer.root_x), i32::from(pointer.root_y)))
    }

    fn warp_pointer(&self, x: i32, y: i32) -> Result<(), Self::Error> {
        self.conn.warp_pointer(
            x11rb::NONE,
            self.root,
            0,
            0,
            0,
            0,
            x.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
            y.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16,
        )?;
        Ok(())
    }

    fn sync(&self) -> Result<(), Self::Error> {
        // A round trip guarantees every earlier request was processed.
        self.conn.get_input_focus()?.reply()?;
        // Requests on windows that vanished meanwhile come back as errors.
        while let Some(event) = self.conn.poll_for_event()? {
            debug!("discarding asynchronous X event {:?}", event);
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_is_second_wm_class_entry() {
        assert_eq!(class_name(b"xterm\0XTerm\0"), Some("XTerm".to_string()));
        assert_eq!(class_name(b"solo\0"), Some("solo".to_string()));
        assert_eq!(class_name(b""), None);
    }

    #[test]
    fn motif_hints() {
        assert!(motif_decorated(&[]));
        assert!(motif_decorated(&[MWM_HINTS_DECORATIONS, 0, 1, 0, 0]));
        assert!(!motif_decorated(&[MWM_HINTS_DECORATIONS, 0, 0, 0, 0]));
        // Decorations field present but not flagged as valid.
        assert!(motif_decorated(&[0, 0, 0, 0, 0]));
    }

    #[test]
    fn work_area_per_desktop() {
        let values = [0, 24, 1920, 1056, 0, 0, 1920, 1080];
        assert_eq!(work_area_entry(&values, 0), Some(Geometry::new(0, 24, 1920, 1056)));
        assert_eq!(work_area_entry(&values, 1), Some(Geometry::new(0, 0, 1920, 1080)));
        assert_eq!(work_area_entry(&values, 7), Some(Geometry::new(0, 24, 1920, 1056)));
        assert_eq!(work_area_entry(&[], 0), None);
    }

    #[test]
    fn values32_decodes_native_endian() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u32.to_ne_bytes());
        bytes.extend_from_slice(&0x0040_0001u32.to_ne_bytes());
        bytes.push(0xff);
        assert_eq!(values32(&bytes), vec![7, 0x0040_0001]);
    }
}
