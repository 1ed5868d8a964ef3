#[cfg(any(feature = "storage-memory", feature = "storage-demo"))]
mod memory;
#[cfg(any(feature = "storage-memory", feature = "storage-demo"))]
pub use memory::*;
#[cfg(feature = "storage-demo")]
mod demo;
#[cfg(feature = "storage-demo")]
pub use demo::*;
