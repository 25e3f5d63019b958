use std::fmt;

use serde::{Deserialize, Serialize};
use ultraviolet::Vec2;

use super::orientation::{Direction, Orientation};

/// Stable particle identifier. Ids are handed out monotonically by the
/// physics arena and never reused within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A circular body participating in the simulation.
///
/// Species and state are open integer domains whose semantics belong to the
/// reaction table. The eight bond slots, one per compass direction, hold the
/// id of the bonded partner; slot strengths live in the physics bond table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub species: i32,
    pub state: i32,
    pub radius: f32,
    pub mass: f32,
    pub charge: f32,
    pub restitution: f32,
    pub orientation: Orientation,
    pub bonds: [Option<ParticleId>; Direction::COUNT],
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    /// Partner of this tick's collision, if any. Reset every tick before
    /// detection; never persisted.
    #[serde(skip)]
    pub collided: Option<ParticleId>,
}

impl Particle {
    #[must_use]
    pub fn new(
        id: ParticleId,
        species: i32,
        radius: f32,
        mass: f32,
        charge: f32,
        restitution: f32,
    ) -> Self {
        Self {
            id,
            species,
            state: 0,
            radius,
            mass,
            charge,
            restitution,
            orientation: Orientation::default(),
            bonds: [None; Direction::COUNT],
            position: Vec2::zero(),
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            collided: None,
        }
    }

    /// Inverse of the rotational inertia diagonal, modeling the particle as
    /// a uniform cube of side 2×radius. Degenerate bodies rotate freely
    /// rather than dividing by zero.
    #[must_use]
    pub fn inverse_inertia(&self) -> f32 {
        let side = 2.0 * self.radius;
        let inertia = self.mass * side * side / 6.0;
        if inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn bond(&self, direction: Direction) -> Option<ParticleId> {
        self.bonds[direction.index()]
    }

    /// First slot referencing `partner`, if any.
    #[must_use]
    pub fn slot_toward(&self, partner: ParticleId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| self.bonds[direction.index()] == Some(partner))
    }

    #[must_use]
    pub fn bond_count(&self) -> usize {
        self.bonds.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Particle {
        Particle::new(ParticleId(7), 3, 0.5, 1.0, 0.0, 1.0)
    }

    #[test]
    fn new_particle_is_at_rest_and_unbonded() {
        let particle = sample();
        assert_eq!(particle.state, 0);
        assert_eq!(particle.velocity, Vec2::zero());
        assert_eq!(particle.force, Vec2::zero());
        assert_eq!(particle.bond_count(), 0);
        assert!(particle.collided.is_none());
    }

    #[test]
    fn inverse_inertia_matches_cube_model() {
        let particle = sample();
        // mass 1, side 1 cube: inertia = 1/6.
        assert!((particle.inverse_inertia() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_body_has_no_rotational_response() {
        let particle = Particle::new(ParticleId(0), 0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(particle.inverse_inertia(), 0.0);
    }

    #[test]
    fn slot_toward_finds_first_reference() {
        let mut particle = sample();
        particle.bonds[Direction::East.index()] = Some(ParticleId(9));
        particle.bonds[Direction::South.index()] = Some(ParticleId(9));
        assert_eq!(particle.slot_toward(ParticleId(9)), Some(Direction::East));
        assert_eq!(particle.slot_toward(ParticleId(1)), None);
    }

    #[test]
    fn serde_round_trip_skips_collision_marker() {
        let mut particle = sample();
        particle.collided = Some(ParticleId(4));
        let json = serde_json::to_string(&particle).unwrap();
        let back: Particle = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, particle.id);
        assert!(back.collided.is_none());
    }
}
