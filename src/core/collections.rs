//! Collection aliases and helpers shared by the engine and the extraction layer.
//!
//! Fast non-cryptographic hash maps and sets keyed by integer ids, small
//! stack-allocated buffers sized for per-facet vertex lists, and the slot map
//! backend the hull engine uses for its working facet store.

mod aliases;
mod buffers;
mod helpers;

pub use aliases::*;
pub use buffers::*;
pub use helpers::*;
