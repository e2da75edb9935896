use anyhow::Result;
use clipwatch_core::PointerState;

pub trait PointerStateSource {
    /// Current button and modifier state.
    ///
    /// `Ok(None)` means the windowing backend cannot report it.
    fn query_pointer_state(&self) -> Result<Option<PointerState>>;
}
