pub mod config;
pub mod mime;
pub mod mode;
pub mod pointer;
pub mod snapshot;

pub use config::*;
pub use mime::*;
pub use mode::*;
pub use pointer::*;
pub use snapshot::*;
