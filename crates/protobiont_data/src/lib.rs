//! Data types shared across the protobiont crates.

pub mod data;

pub use data::bond::{Bond, BondKey};
pub use data::orientation::{Direction, Orientation};
pub use data::particle::{Particle, ParticleId};
pub use data::reaction::{Reaction, ReactionKind, SpeciesRule, StateRule};
