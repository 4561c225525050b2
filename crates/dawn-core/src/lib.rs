//! Foundational low-level utilities shared across Dawn crates.
//!
//! Provides the push-window predicate, UTC-to-local timezone conversion,
//! and the atomic file-write helper used by cache persistence.

pub mod atomic_io;
pub mod window;

pub use atomic_io::write_text_atomic;
pub use window::{in_push_window, now_utc, to_local, TimeError};
