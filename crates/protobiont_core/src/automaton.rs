//! The tick loop: physics, then chemistry, under one seeded random stream.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chemistry::Chemistry;
use crate::config::SimConfig;
use crate::physics::{Census, Physics};

/// What one call to [`Automaton::step`] did.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub tick: u64,
    pub collisions: usize,
    pub bonds_broken: usize,
    pub reactions: usize,
}

/// Owns the simulation state and drives it tick by tick.
///
/// A configured seed gives bit-identical runs; without one the stream is
/// seeded from the operating system.
#[derive(Debug)]
pub struct Automaton {
    physics: Physics,
    chemistry: Chemistry,
    rng: ChaCha8Rng,
    tick: u64,
}

impl Automaton {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            physics: Physics::new(config),
            chemistry: Chemistry::new(),
            rng,
            tick: 0,
        }
    }

    /// Advances the world one tick: the five physics phases, then the
    /// reaction scan over the updated positions.
    pub fn step(&mut self) -> TickReport {
        let dt = self.physics.config().grid.time_step;
        let stats = self.physics.step(dt, &mut self.rng);
        let reactions = self.chemistry.step(&mut self.physics);
        self.tick += 1;
        TickReport {
            tick: self.tick,
            collisions: stats.collisions,
            bonds_broken: stats.bonds_broken,
            reactions,
        }
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn census(&self) -> Census {
        self.physics.census()
    }

    #[must_use]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut Physics {
        &mut self.physics
    }

    #[must_use]
    pub fn chemistry(&self) -> &Chemistry {
        &self.chemistry
    }

    pub fn chemistry_mut(&mut self) -> &mut Chemistry {
        &mut self.chemistry
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}
