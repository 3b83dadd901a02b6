//! Root-window [`EventSource`] and the remote-control sender.
//!
//! The source owns its own X connection, selects property, substructure and
//! key-release events on the root window and grabs the configured hotkeys.
//! Remote commands arrive as `_XTILER_REMOTE` client messages whose first
//! 32-bit data item is the command opcode.

use super::{Atoms, X11WmError};
use crate::command::{Command, Event};
use crate::traits::EventSource;
use log::{debug, info, warn};
use std::sync::mpsc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt as _, EventMask, GrabMode,
    ModMask, Window,
};
use x11rb::protocol::Event as X11Event;
use x11rb::rust_connection::RustConnection;

/// The root-window properties and message type the engine reacts to.
#[derive(Debug, Clone, Copy)]
struct Watched {
    active_window: Atom,
    current_desktop: Atom,
    client_list: Atom,
    remote: Atom,
}

impl From<&Atoms> for Watched {
    fn from(atoms: &Atoms) -> Self {
        Self {
            active_window: atoms._NET_ACTIVE_WINDOW,
            current_desktop: atoms._NET_CURRENT_DESKTOP,
            client_list: atoms._NET_CLIENT_LIST,
            remote: atoms._XTILER_REMOTE,
        }
    }
}

/// Modifier mask for the key grabs; `-1` means any modifier.
fn grab_modifiers(modifier: i32) -> ModMask {
    if modifier < 0 {
        ModMask::ANY
    } else {
        ModMask::from(modifier as u16)
    }
}

/// Map one X event to an engine event.
fn translate(event: &X11Event, watched: &Watched) -> Option<Event> {
    match event {
        X11Event::PropertyNotify(e) if e.atom == watched.active_window => {
            Some(Event::ActiveWindowChanged)
        }
        X11Event::PropertyNotify(e) if e.atom == watched.current_desktop => {
            Some(Event::DesktopChanged)
        }
        X11Event::PropertyNotify(e) if e.atom == watched.client_list => {
            Some(Event::WindowListChanged)
        }
        X11Event::ConfigureNotify(e) => Some(Event::GeometryChanged(e.window)),
        X11Event::KeyRelease(e) => Some(Event::KeyReleased(e.detail)),
        X11Event::ClientMessage(e) if e.type_ == watched.remote && e.format == 32 => {
            let opcode = e.data.as_data32()[0];
            match Command::try_from(opcode) {
                Ok(command) => Some(Event::Command(command)),
                Err(err) => {
                    warn!("remote control: {}", err);
                    None
                }
            }
        }
        X11Event::Error(e) => {
            debug!("X error on the event connection: {:?}", e);
            None
        }
        _ => None,
    }
}

/// An [`EventSource`] listening on the X server's root window.
pub struct X11EventSource {
    conn: RustConnection,
    watched: Watched,
}

impl X11EventSource {
    /// Connect, select the root-window events and grab `keys` with
    /// `modifier`.
    pub fn connect(modifier: i32, keys: impl IntoIterator<Item = u8>) -> Result<Self, X11WmError> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?.reply()?;

        let mask = EventMask::PROPERTY_CHANGE | EventMask::SUBSTRUCTURE_NOTIFY | EventMask::KEY_RELEASE;
        conn.change_window_attributes(root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()?;

        let modifiers = grab_modifiers(modifier);
        for key in keys {
            conn.grab_key(true, root, modifiers, key, GrabMode::ASYNC, GrabMode::ASYNC)?;
            debug!("grabbed key code {} (modifiers 0x{:x})", key, u16::from(modifiers));
        }
        conn.flush()?;

        Ok(Self {
            conn,
            watched: Watched::from(&atoms),
        })
    }
}

impl EventSource for X11EventSource {
    type Error = X11WmError;

    /// Block on the X event queue and forward every relevant event.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        info!("listening for X events");
        loop {
            let event = self.conn.wait_for_event()?;
            if let Some(event) = translate(&event, &self.watched) {
                if sink.send(event).is_err() {
                    info!("sink closed, shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Send `command` to a running daemon as an `_XTILER_REMOTE` client
/// message on the root window.
pub fn send_remote(command: Command) -> Result<(), X11WmError> {
    let (conn, screen_num) = RustConnection::connect(None)?;
    let root: Window = conn.setup().roots[screen_num].root;
    let atoms = Atoms::new(&conn)?.reply()?;
    let event = ClientMessageEvent::new(
        32,
        root,
        atoms._XTILER_REMOTE,
        [command.opcode(), 0, 0, 0, 0],
    );
    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
        event,
    )?;
    conn.get_input_focus()?.reply()?;
    Ok(())
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use x11rb::protocol::xproto::{
        ConfigureNotifyEvent, KeyButMask, KeyReleaseEvent, Property, PropertyNotifyEvent,
    };

    fn watched() -> Watched {
        Watched {
            active_window: 301,
            current_desktop: 302,
            client_list: 303,
            remote: 400,
        }
    }

    fn property(atom: Atom) -> X11Event {
        X11Event::PropertyNotify(PropertyNotifyEvent {
            response_type: x11rb::protocol::xproto::PROPERTY_NOTIFY_EVENT,
            sequence: 0,
            window: 1,
            atom,
            time: 0,
            state: Property::NEW_VALUE,
        })
    }

    fn remote(opcode: u32) -> X11Event {
        X11Event::ClientMessage(ClientMessageEvent::new(32, 1, 400u32, [opcode, 0, 0, 0, 0]))
    }

    #[test]
    fn root_properties_map_to_events() {
        let w = watched();
        assert_eq!(translate(&property(301), &w), Some(Event::ActiveWindowChanged));
        assert_eq!(translate(&property(302), &w), Some(Event::DesktopChanged));
        assert_eq!(translate(&property(303), &w), Some(Event::WindowListChanged));
        assert_eq!(translate(&property(999), &w), None);
    }

    #[test]
    fn configure_and_keys() {
        let w = watched();
        let configure = X11Event::ConfigureNotify(ConfigureNotifyEvent {
            response_type: x11rb::protocol::xproto::CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: 1,
            window: 0x1200003,
            above_sibling: 0,
            x: 0,
            y: 0,
            width: 100,
            height: 100,
            border_width: 0,
            override_redirect: false,
        });
        assert_eq!(translate(&configure, &w), Some(Event::GeometryChanged(0x1200003)));

        let key = X11Event::KeyRelease(KeyReleaseEvent {
            response_type: x11rb::protocol::xproto::KEY_RELEASE_EVENT,
            detail: 54,
            sequence: 0,
            time: 0,
            root: 1,
            event: 1,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: KeyButMask::from(0u16),
            same_screen: true,
        });
        assert_eq!(translate(&key, &w), Some(Event::KeyReleased(54)));
    }

    #[test]
    fn remote_opcodes() {
        let w = watched();
        assert_eq!(
            translate(&remote(6), &w),
            Some(Event::Command(Command::CycleTiler))
        );
        assert_eq!(
            translate(&remote(25), &w),
            Some(Event::Command(Command::FocusPrevious))
        );
        assert_eq!(translate(&remote(26), &w), None);

        let foreign = X11Event::ClientMessage(ClientMessageEvent::new(32, 1, 401u32, [6, 0, 0, 0, 0]));
        assert_eq!(translate(&foreign, &w), None);
    }

    #[test]
    fn any_modifier() {
        assert_eq!(grab_modifiers(-1), ModMask::ANY);
        assert_eq!(grab_modifiers(64), ModMask::M4);
        assert_eq!(grab_modifiers(0), ModMask::from(0u16));
    }
}
