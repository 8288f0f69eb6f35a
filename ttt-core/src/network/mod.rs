//! Link transport: raw frame links, capture filters and the
//! request/response transport built on them.

pub mod filter;
pub mod link;
pub mod memory;
#[cfg(target_os = "linux")]
pub mod raw;
pub mod transport;

pub use filter::{CaptureFilter, Predicate};
pub use link::{Captured, Direction, Link};
pub use memory::MemoryLink;
#[cfg(target_os = "linux")]
pub use raw::RawLink;
pub use transport::{Transport, capture_filtered};
