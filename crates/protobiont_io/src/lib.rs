//! # Protobiont IO
//!
//! Persistence layer for the protobiont simulation.
//!
//! Saved runs are flat whitespace-delimited text: a particle section, a
//! bond-association section and a reaction section, each with an explicit
//! leading record count. A load rebuilds the exact particle/bond graph and
//! the reaction table; anything malformed aborts with a structured error.

/// Error types and result alias for I/O operations
pub mod error;
/// Save/load of a full automaton in the flat text format
pub mod persistence;
/// Whitespace token scanning and record writing
pub mod text;

pub use error::{IoError, Result};
pub use persistence::{load_automaton, load_path, save_automaton, save_path};
