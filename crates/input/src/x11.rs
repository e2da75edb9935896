use crate::traits::PointerStateSource;
use anyhow::{Context, Result};
use clipwatch_core::PointerState;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

pub struct X11PointerSource {
    conn: RustConnection,
    root: Window,
}

impl X11PointerSource {
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = RustConnection::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        Ok(Self { conn, root })
    }
}

impl PointerStateSource for X11PointerSource {
    fn query_pointer_state(&self) -> Result<Option<PointerState>> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        let mask = u16::from(reply.mask);
        log::trace!("Pointer mask: {:#06x}", mask);
        Ok(Some(PointerState::from_key_but_mask(mask)))
    }
}
