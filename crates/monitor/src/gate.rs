use clipwatch_input::PointerStateSource;

/// True while the primary button or shift is held, i.e. the user is probably
/// still extending a mouse selection.
///
/// Backends that cannot report pointer state never hold a selection back.
pub fn is_selection_incomplete(pointer: &dyn PointerStateSource) -> bool {
    match pointer.query_pointer_state() {
        Ok(Some(state)) => state.primary_button_down() || state.shift_down(),
        Ok(None) => false,
        Err(e) => {
            tracing::debug!("Failed to query pointer state: {}", e);
            false
        }
    }
}
