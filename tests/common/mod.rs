//! Shared helpers for integration tests.

use protobiont_core::{Automaton, Bond, Direction, ParticleId, SimConfig};
use protobiont_lib::experiment::replicator;
use ultraviolet::Vec2;

struct ParticleSpec {
    species: i32,
    state: i32,
    x: f32,
    y: f32,
}

/// Builds a seeded automaton with an explicit starting population. Bonds
/// reference particles by insertion index.
#[allow(dead_code)]
pub struct AutomatonBuilder {
    config: SimConfig,
    particles: Vec<ParticleSpec>,
    bonds: Vec<(usize, Direction, usize, Direction)>,
    replicator_rules: bool,
}

#[allow(dead_code)]
impl AutomatonBuilder {
    pub fn new() -> Self {
        Self {
            config: SimConfig::default(),
            particles: Vec::new(),
            bonds: Vec::new(),
            replicator_rules: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_particle(mut self, species: i32, state: i32, x: f32, y: f32) -> Self {
        self.particles.push(ParticleSpec {
            species,
            state,
            x,
            y,
        });
        self
    }

    pub fn with_bond(mut self, a: usize, slot_a: Direction, b: usize, slot_b: Direction) -> Self {
        self.bonds.push((a, slot_a, b, slot_b));
        self
    }

    pub fn with_replicator_rules(mut self) -> Self {
        self.replicator_rules = true;
        self
    }

    pub fn build(self) -> (Automaton, Vec<ParticleId>) {
        let mut automaton = Automaton::new(self.config);
        if self.replicator_rules {
            automaton
                .chemistry_mut()
                .set_reactions(replicator::reactions());
        }
        let mut ids = Vec::with_capacity(self.particles.len());
        for spec in &self.particles {
            let id = automaton
                .physics_mut()
                .create_particle(spec.species)
                .expect("population cap hit while building test world");
            let particle = automaton.physics_mut().particle_mut(id).unwrap();
            particle.state = spec.state;
            particle.position = Vec2::new(spec.x, spec.y);
            ids.push(id);
        }
        for &(a, slot_a, b, slot_b) in &self.bonds {
            assert!(
                automaton.physics_mut().create_bond(
                    ids[a],
                    slot_a,
                    ids[b],
                    slot_b,
                    Bond::DEFAULT_STRENGTH,
                ),
                "bond {a}->{b} could not be created"
            );
        }
        (automaton, ids)
    }
}

/// Snapshot of per-particle dynamics, usable for run-to-run comparison.
#[allow(dead_code)]
#[must_use]
pub fn trajectory(automaton: &Automaton) -> Vec<(ParticleId, i32, i32, f32, f32, f32, f32)> {
    automaton
        .physics()
        .particles()
        .map(|p| {
            (
                p.id,
                p.species,
                p.state,
                p.position.x,
                p.position.y,
                p.velocity.x,
                p.velocity.y,
            )
        })
        .collect()
}
