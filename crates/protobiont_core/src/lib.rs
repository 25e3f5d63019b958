//! # Protobiont Core
//!
//! The simulation engine for Protobiont - an artificial chemistry of
//! bonded particles in a small 2D world.
//!
//! This crate contains the deterministic simulation logic, including:
//! - Particle motion with Brownian agitation, viscosity and hard walls
//! - Electrostatic and bond-spring force accumulation
//! - Impulse-based collision resolution
//! - Oriented 3x3 neighborhood addressing
//! - Pattern-matched reactions that rewrite the particle graph
//! - Metrics collection and structured logging
//!
//! ## Architecture
//!
//! One [`automaton::Automaton`] owns a [`physics::Physics`] arena, a
//! [`chemistry::Chemistry`] rule table and a seeded random stream. A tick
//! runs the five physics phases in fixed order, then scans every particle
//! for its first matching reaction. Everything is single-threaded and
//! reproducible under a fixed seed.
//!
//! ## Example
//!
//! ```
//! use protobiont_core::automaton::Automaton;
//! use protobiont_core::config::SimConfig;
//!
//! let config = SimConfig {
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let mut automaton = Automaton::new(config);
//! automaton.physics_mut().create_particle(1);
//! let report = automaton.step();
//! assert_eq!(report.tick, 1);
//! ```

/// Tick loop driving physics then chemistry
pub mod automaton;
/// Reaction matching and application
pub mod chemistry;
/// Collision detection and impulse resolution
pub mod collision;
/// Configuration management for simulation parameters
pub mod config;
/// Run statistics and logging setup
pub mod metrics;
/// Oriented 3x3 neighborhood addressing
pub mod neighborhood;
/// Particle motion, bonding and force accumulation
pub mod physics;

pub use automaton::{Automaton, TickReport};
pub use chemistry::Chemistry;
pub use config::SimConfig;
pub use metrics::{init_logging, Metrics};
pub use physics::{cell_center, Census, Physics};
pub use protobiont_data::{
    Bond, BondKey, Direction, Orientation, Particle, ParticleId, Reaction, ReactionKind,
    SpeciesRule, StateRule,
};
