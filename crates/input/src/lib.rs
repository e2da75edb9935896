pub mod traits;
pub mod unsupported;

#[cfg(target_os = "linux")]
pub mod x11;

pub use traits::*;
pub use unsupported::UnsupportedPointerSource;

#[cfg(target_os = "linux")]
pub use x11::X11PointerSource;

/// The X11 pointer source when a display is reachable, otherwise the fallback.
pub fn default_pointer_source() -> Box<dyn PointerStateSource> {
    #[cfg(target_os = "linux")]
    {
        match X11PointerSource::new() {
            Ok(source) => return Box::new(source),
            Err(e) => tracing::warn!("Pointer state unavailable, selections are never deferred: {}", e),
        }
    }
    Box::new(UnsupportedPointerSource)
}
