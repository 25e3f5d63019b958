//! # Protobiont
//!
//! A 2D artificial chemistry in which molecules assembled from bonded
//! particles replicate through catalyst-driven reaction rules.
//!
//! The workspace splits into three crates plus this binary shell:
//! - `protobiont_data`: particle, bond, orientation and reaction types
//! - `protobiont_core`: the deterministic physics and chemistry engine
//! - `protobiont_io`: save/load of whole runs in a flat text format
//!
//! This crate carries the replicator experiment itself: the reaction rule
//! table, population seeding and the run driver behind the CLI.

pub mod experiment;
