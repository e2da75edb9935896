pub mod error;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(target_os = "linux")]
pub mod store;

#[cfg(target_os = "linux")]
mod transfer;

pub use error::ReadError;
pub use traits::*;

#[cfg(target_os = "linux")]
pub use store::ArboardStore;
#[cfg(target_os = "linux")]
pub use x11::{X11Clipboard, X11OwnerListener};
