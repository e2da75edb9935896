use crate::error::ReadError;
use crate::traits::{ClipboardReader, OwnerChangeListener};
use crate::transfer::{IncrTransfer, NotifyMatch, Request, TransferSlots};
use anyhow::{Context, Result};
use clipwatch_core::{ClipboardMode, DataMap, RawSnapshot, MIME_TEXT, TIMESTAMP_FORMAT};
use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use x11rb::connection::Connection;
use x11rb::protocol::xfixes::{ConnectionExt as _, SelectionEventMask};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ConnectionExt as _, CreateWindowAux, EventMask, GetPropertyReply, Property, Window,
    WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        PRIMARY,
        CLIPBOARD,
        TIMESTAMP,
        INCR,
        UTF8_STRING,
        WM_NAME,
        _NET_WM_NAME,
        _NET_ACTIVE_WINDOW,
    }
}

const TITLE_MAX_LONGS: u32 = 256;
const TRANSFER_SLOTS: usize = 4;
const INCR_RESERVE_MAX: usize = 16 * 1024 * 1024;

fn selection_atom(atoms: &Atoms, mode: ClipboardMode) -> Atom {
    match mode {
        ClipboardMode::Clipboard => atoms.CLIPBOARD,
        ClipboardMode::Selection => atoms.PRIMARY,
    }
}

/// Reads the X11 selections by converting them onto a hidden window.
pub struct X11Clipboard {
    conn: RustConnection,
    root: Window,
    window: Window,
    atoms: Atoms,
    timeout: Duration,
    targets: Mutex<HashMap<String, Atom>>,
    slots: Mutex<TransferSlots>,
}

impl X11Clipboard {
    pub fn new(timeout: Duration) -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?.reply()?;

        let window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            COPY_FROM_PARENT,
            &CreateWindowAux::default().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        conn.flush()?;

        let mut properties = Vec::with_capacity(TRANSFER_SLOTS);
        for slot in 0..TRANSFER_SLOTS {
            let name = format!("CLIPWATCH_TRANSFER_{}", slot);
            properties.push(conn.intern_atom(false, name.as_bytes())?.reply()?.atom);
        }

        Ok(Self {
            conn,
            root,
            window,
            atoms,
            timeout,
            targets: Mutex::new(HashMap::new()),
            slots: Mutex::new(TransferSlots::new(properties)),
        })
    }

    fn target_atom(&self, format: &str) -> Result<Atom, ReadError> {
        if format == MIME_TEXT {
            return Ok(self.atoms.UTF8_STRING);
        }

        let mut targets = self
            .targets
            .lock()
            .map_err(|_| ReadError::backend(anyhow::anyhow!("target cache poisoned")))?;
        if let Some(atom) = targets.get(format) {
            return Ok(*atom);
        }

        let atom = self
            .conn
            .intern_atom(false, format.as_bytes())
            .map_err(ReadError::backend)?
            .reply()
            .map_err(ReadError::backend)?
            .atom;
        targets.insert(format.to_string(), atom);
        Ok(atom)
    }

    fn selection_owner(&self, selection: Atom) -> Result<Window, ReadError> {
        Ok(self
            .conn
            .get_selection_owner(selection)
            .map_err(ReadError::backend)?
            .reply()
            .map_err(ReadError::backend)?
            .owner)
    }

    /// Returns `Ok(None)` when the owner refuses the target.
    fn convert(&self, selection: Atom, target: Atom) -> Result<Option<Vec<u8>>, ReadError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ReadError::backend(anyhow::anyhow!("transfer slots poisoned")))?;
        let request = Request {
            selection,
            target,
            property: slots.acquire(Instant::now()),
        };

        self.conn
            .delete_property(self.window, request.property)
            .map_err(ReadError::backend)?;
        self.conn
            .convert_selection(self.window, selection, target, request.property, CURRENT_TIME)
            .map_err(ReadError::backend)?;
        self.conn.flush().map_err(ReadError::backend)?;

        let deadline = Instant::now() + self.timeout;
        let mut incr: Option<IncrTransfer> = None;
        loop {
            let now = Instant::now();
            if now >= incr.as_ref().map_or(deadline, IncrTransfer::deadline) {
                slots.abandon(request, now);
                return Err(ReadError::Timeout);
            }

            let event = match self.conn.poll_for_event().map_err(ReadError::backend)? {
                Some(event) => event,
                None => {
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
            };

            match event {
                Event::SelectionNotify(ev) if ev.requestor == self.window => {
                    match slots.classify(&request, ev.selection, ev.target, ev.property) {
                        NotifyMatch::Current if incr.is_none() => {
                            if ev.property == NONE {
                                return Ok(None);
                            }

                            // Deleting the property also tells an INCR owner to send the first chunk.
                            let reply = self.take_property(request.property)?;
                            if reply.type_ != self.atoms.INCR {
                                return Ok(Some(reply.value));
                            }

                            let size_hint = reply.value32().and_then(|mut values| values.next()).unwrap_or(0);
                            log::trace!("Receiving target {} in chunks ({} bytes)", target, size_hint);
                            incr = Some(IncrTransfer::new(
                                (size_hint as usize).min(INCR_RESERVE_MAX),
                                self.timeout,
                                Instant::now(),
                            ));
                        }
                        NotifyMatch::Late(Some(property)) => {
                            log::debug!("Dropping late answer for target {}", ev.target);
                            self.conn
                                .delete_property(self.window, property)
                                .map_err(ReadError::backend)?;
                        }
                        _ => {}
                    }
                }
                Event::PropertyNotify(ev)
                    if ev.window == self.window
                        && ev.atom == request.property
                        && ev.state == Property::NEW_VALUE =>
                {
                    let Some(transfer) = incr.as_mut() else {
                        continue;
                    };
                    let chunk = self.take_property(request.property)?.value;
                    if transfer.push_chunk(chunk, Instant::now()) {
                        return Ok(incr.map(IncrTransfer::into_data));
                    }
                }
                _ => {}
            }
        }
    }

    fn take_property(&self, property: Atom) -> Result<GetPropertyReply, ReadError> {
        self.conn
            .get_property(true, self.window, property, AtomEnum::ANY, 0, u32::MAX / 4)
            .map_err(ReadError::backend)?
            .reply()
            .map_err(ReadError::backend)
    }

    fn text_property(&self, window: Window, property: Atom, type_: Atom) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, TITLE_MAX_LONGS)
            .ok()?
            .reply()
            .ok()?;
        if reply.value.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&reply.value).into_owned())
        }
    }

    fn window_title(&self, window: Window) -> Option<String> {
        self.text_property(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .or_else(|| self.text_property(window, self.atoms.WM_NAME, AtomEnum::STRING.into()))
    }

    fn active_window(&self) -> Option<Window> {
        let reply = self
            .conn
            .get_property(false, self.root, self.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        let window = reply.value32()?.next();
        window.filter(|window| *window != NONE)
    }
}

impl ClipboardReader for X11Clipboard {
    fn read_buffer(&self, mode: ClipboardMode, formats: &[String]) -> Result<RawSnapshot, ReadError> {
        let selection = selection_atom(&self.atoms, mode);
        if self.selection_owner(selection)? == NONE {
            return Err(ReadError::NoOwner);
        }

        let mut data = DataMap::new();
        if let Some(timestamp) = self.convert(selection, self.atoms.TIMESTAMP)? {
            data.insert(TIMESTAMP_FORMAT.to_string(), timestamp);
        }

        let mut converted = 0;
        for format in formats {
            let target = self.target_atom(format)?;
            if let Some(bytes) = self.convert(selection, target)? {
                data.insert(format.clone(), bytes);
                converted += 1;
            }
        }

        if converted == 0 {
            return Err(ReadError::Empty);
        }

        Ok(RawSnapshot::new(data).with_owner(self.owner_title(mode)))
    }

    fn owner_title(&self, mode: ClipboardMode) -> String {
        let selection = selection_atom(&self.atoms, mode);
        let owner = match self.selection_owner(selection) {
            Ok(owner) if owner != NONE => owner,
            _ => return String::new(),
        };

        // Owners are usually hidden windows, so fall back to the focused window.
        self.window_title(owner)
            .or_else(|| self.active_window().and_then(|window| self.window_title(window)))
            .unwrap_or_default()
    }
}

/// Watches XFixes selection-owner notifications on a dedicated connection.
pub struct X11OwnerListener;

impl X11OwnerListener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for X11OwnerListener {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnerChangeListener for X11OwnerListener {
    fn start_listener(&self, callback: Box<dyn Fn(ClipboardMode) + Send + Sync>) -> Result<()> {
        let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?.reply()?;

        let version = conn.xfixes_query_version(5, 0)?.reply()?;
        log::trace!("XFIXES version: {}.{}", version.major_version, version.minor_version);

        for selection in [atoms.CLIPBOARD, atoms.PRIMARY] {
            conn.xfixes_select_selection_input(root, selection, SelectionEventMask::SET_SELECTION_OWNER)?;
        }
        conn.flush()?;

        thread::spawn(move || loop {
            match conn.wait_for_event() {
                Ok(Event::XfixesSelectionNotify(ev)) => {
                    let mode = if ev.selection == atoms.CLIPBOARD {
                        ClipboardMode::Clipboard
                    } else if ev.selection == atoms.PRIMARY {
                        ClipboardMode::Selection
                    } else {
                        continue;
                    };
                    callback(mode);
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("X11 owner listener stopped: {}", e);
                    break;
                }
            }
        });

        Ok(())
    }
}
