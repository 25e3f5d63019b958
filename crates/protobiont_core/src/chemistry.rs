//! Reaction matching and application.
//!
//! Each tick scans the particles that existed when the tick began, in
//! insertion order. A particle's neighborhood is rebuilt from the live
//! arena, so effects applied by earlier particles in the same tick are
//! visible to later ones; particles spawned this tick wait for the next.
//! The first reaction in table order whose pattern holds wins for that
//! particle; later matches are not combined.

use tracing::debug;
use ultraviolet::Vec2;

use protobiont_data::{Orientation, ParticleId, Reaction, ReactionKind, SpeciesRule};

use crate::neighborhood::Neighborhood;
use crate::physics::Physics;

#[derive(Debug, Default)]
pub struct Chemistry {
    reactions: Vec<Reaction>,
}

impl Chemistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reactions(reactions: Vec<Reaction>) -> Self {
        Self { reactions }
    }

    #[must_use]
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn add_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub fn set_reactions(&mut self, reactions: Vec<Reaction>) {
        self.reactions = reactions;
    }

    /// Runs the reaction scan over the current population. Returns how many
    /// particles had a reaction applied.
    pub fn step(&self, physics: &mut Physics) -> usize {
        let mut applied = 0;
        for id in physics.ids() {
            // Destroyed earlier in this same scan.
            let Some(focal) = physics.particle(id) else {
                continue;
            };
            let hood = Neighborhood::around(physics, focal);
            let Some(index) = self
                .reactions
                .iter()
                .position(|reaction| matches(reaction, &hood, physics))
            else {
                continue;
            };
            debug!(
                reaction = %self.reactions[index].description,
                particle = %id,
                "reaction applied"
            );
            self.apply(index, &hood, physics);
            applied += 1;
        }
        applied
    }

    fn apply(&self, index: usize, hood: &Neighborhood, physics: &mut Physics) {
        let reaction = &self.reactions[index];
        if reaction.kind == ReactionKind::Create {
            spawn(reaction, hood, physics);
            return;
        }

        // Sentinel constraints at the target cell affect no particle.
        let SpeciesRule::Is(required) = reaction.target_species() else {
            return;
        };
        let targets: Vec<ParticleId> = hood.cell(reaction.target_x, reaction.target_y).to_vec();
        for target_id in targets {
            let keep = physics
                .particle(target_id)
                .is_some_and(|target| target.species == required);
            if keep {
                affect(reaction, hood.focal(), target_id, physics);
            }
        }
    }
}

/// The pattern holds iff every constrained cell is satisfied: emptiness and
/// occupancy checks on the bucket, or at least one resident of the required
/// species whose state passes the cell's state rule.
fn matches(reaction: &Reaction, hood: &Neighborhood, physics: &Physics) -> bool {
    for x in 0..3 {
        for y in 0..3 {
            match reaction.species[x][y] {
                SpeciesRule::Ignore => {}
                SpeciesRule::Empty => {
                    if !hood.cell(x, y).is_empty() {
                        return false;
                    }
                }
                SpeciesRule::Occupied => {
                    if hood.cell(x, y).is_empty() {
                        return false;
                    }
                }
                SpeciesRule::Is(species) => {
                    let state_rule = reaction.states[x][y];
                    let found = hood.cell(x, y).iter().any(|&id| {
                        physics
                            .particle(id)
                            .is_some_and(|p| p.species == species && state_rule.accepts(p.state))
                    });
                    if !found {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// State writes land first, then the kind effect. Reads of the focal
/// particle happen per target so that effects on it from earlier targets in
/// the same application are honored.
fn affect(reaction: &Reaction, focal_id: ParticleId, target_id: ParticleId, physics: &mut Physics) {
    if let Some(state) = reaction.source_state {
        if let Some(focal) = physics.particle_mut(focal_id) {
            focal.state = state;
        }
    }
    if let Some(state) = reaction.target_state {
        if let Some(target) = physics.particle_mut(target_id) {
            target.state = state;
        }
    }

    match reaction.kind {
        // Handled before the target loop.
        ReactionKind::Create => {}
        ReactionKind::Bond => {
            let Some(focal) = physics.particle(focal_id) else {
                return;
            };
            let source = focal.orientation.aim(reaction.source_bond.index() as i32);
            let target = focal.orientation.aim(reaction.target_bond.index() as i32);
            physics.create_bond(focal_id, source, target_id, target, reaction.bond_strength);
        }
        ReactionKind::SetSpecies => {
            if let Some(target) = physics.particle_mut(target_id) {
                target.species = reaction.new_species;
            }
        }
        // Covered by the uniform state writes above.
        ReactionKind::SetState => {}
        ReactionKind::Orient => {
            let Some(focal) = physics.particle(focal_id) else {
                return;
            };
            let direction = focal.orientation.aim(reaction.orientation.direction.index() as i32);
            let mirrored = focal.orientation.mirror_of_mirror(reaction.orientation.mirrored);
            if let Some(target) = physics.particle_mut(target_id) {
                target.orientation = Orientation::new(direction, mirrored);
            }
        }
        ReactionKind::Unbond => {
            let Some(target) = physics.particle(target_id) else {
                return;
            };
            let direction = target.orientation.aim(reaction.source_bond.index() as i32);
            physics.remove_bond(target_id, direction);
        }
        ReactionKind::Destroy => {
            physics.remove_particle(target_id);
        }
    }
}

/// Spawns at the world cell addressed by the resolved target coordinates.
/// Off-grid targets and a full population both quietly spawn nothing.
fn spawn(reaction: &Reaction, hood: &Neighborhood, physics: &mut Physics) {
    let Some(focal) = physics.particle(hood.focal()) else {
        return;
    };
    let (cell_x, cell_y) = hood.resolve(reaction.target_x, reaction.target_y);
    let position = focal.position + Vec2::new(cell_x as f32 - 1.0, cell_y as f32 - 1.0);
    let velocity = focal.velocity;
    let parent = focal.orientation;

    let grid = &physics.config().grid;
    if position.x < 0.0
        || position.x >= grid.width as f32
        || position.y < 0.0
        || position.y >= grid.height as f32
    {
        return;
    }
    let Some(spawned_id) = physics.create_particle(reaction.new_species) else {
        return;
    };

    let direction = parent.aim(reaction.orientation.direction.index() as i32);
    let mirrored = parent.mirror_of_mirror(reaction.orientation.mirrored);
    if let Some(spawned) = physics.particle_mut(spawned_id) {
        spawned.position = position;
        spawned.velocity = velocity;
        spawned.orientation = Orientation::new(direction, mirrored);
        if let Some(state) = reaction.target_state {
            spawned.state = state;
        }
    }
    if let Some(state) = reaction.source_state {
        if let Some(focal) = physics.particle_mut(hood.focal()) {
            focal.state = state;
        }
    }
}
