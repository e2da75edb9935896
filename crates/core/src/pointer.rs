use serde::{Deserialize, Serialize};

/// X11 core protocol `ShiftMask`.
pub const SHIFT_MASK: u16 = 1 << 0;
/// X11 core protocol `Button1Mask`.
pub const BUTTON1_MASK: u16 = 1 << 8;

/// Point-in-time pointer button and keyboard modifier state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    pub button_mask: u16,
    pub modifier_mask: u16,
}

impl PointerState {
    /// Split a raw `KeyButMask` value into its button and modifier halves.
    pub fn from_key_but_mask(mask: u16) -> Self {
        Self {
            button_mask: mask & 0xff00,
            modifier_mask: mask & 0x00ff,
        }
    }

    pub fn primary_button_down(&self) -> bool {
        self.button_mask & BUTTON1_MASK != 0
    }

    pub fn shift_down(&self) -> bool {
        self.modifier_mask & SHIFT_MASK != 0
    }
}
