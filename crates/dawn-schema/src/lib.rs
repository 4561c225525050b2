//! Canonical agenda data model and its validation rules.
//!
//! An [`Agenda`] is canonical only after [`Agenda::from_value`] has accepted
//! it; intermediate shapes recovered from model output never reach the cache
//! or the renderer directly. Validation is explicit field-presence checking
//! returning a tagged [`SchemaError`], with no reflective coercion.

mod model;
mod validate;
mod wall_clock;

pub use model::{Agenda, Block, Priority};
pub use validate::SchemaError;
pub use wall_clock::pad_wall_clock;

/// Maximum number of characters retained in an agenda focus line.
pub const FOCUS_MAX_CHARS: usize = 200;
