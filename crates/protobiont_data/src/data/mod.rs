//! Core data structures for the protobiont simulation.

pub mod bond;
pub mod orientation;
pub mod particle;
pub mod reaction;
