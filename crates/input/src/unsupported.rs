use crate::traits::PointerStateSource;
use anyhow::Result;
use clipwatch_core::PointerState;

/// Used when not running under X11.
pub struct UnsupportedPointerSource;

impl PointerStateSource for UnsupportedPointerSource {
    fn query_pointer_state(&self) -> Result<Option<PointerState>> {
        Ok(None)
    }
}
