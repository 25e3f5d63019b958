//! Particle motion, bonding and force accumulation.
//!
//! Particles live in an insertion-ordered arena addressed by id. Bond slots
//! on the particles carry the connection topology; the strengths live in a
//! table keyed by unordered particle pairs, so parallel bonds between the
//! same two particles share one strength record.
//!
//! One tick runs five ordered passes: integration, overstretch breakage,
//! electrostatics, bond springs, then collision detection and resolution.
//! Later passes read the positions committed by integration, so the order is
//! load-bearing.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::Rng;
use ultraviolet::Vec2;

use protobiont_data::{Bond, BondKey, Direction, Particle, ParticleId};

use crate::config::SimConfig;

/// Snaps a coordinate to the center of its cell.
#[must_use]
pub fn cell_center(coordinate: f32) -> f32 {
    coordinate.trunc() + 0.5
}

/// Per-tick counters reported by [`Physics::step`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    pub collisions: usize,
    pub bonds_broken: usize,
}

/// Population counts keyed by `(species, state)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Census {
    pub total: usize,
    pub by_species_state: BTreeMap<(i32, i32), usize>,
}

impl Census {
    #[must_use]
    pub fn count(&self, species: i32, state: i32) -> usize {
        self.by_species_state
            .get(&(species, state))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct Physics {
    pub(crate) config: SimConfig,
    pub(crate) particles: Vec<Particle>,
    pub(crate) index: HashMap<ParticleId, usize>,
    pub(crate) bonds: HashMap<BondKey, Bond>,
    pub(crate) next_id: u64,
}

impl Physics {
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            index: HashMap::new(),
            bonds: HashMap::new(),
            next_id: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    #[must_use]
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.index.get(&id).map(|&i| &self.particles[i])
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.index.get(&id).map(|&i| &mut self.particles[i])
    }

    #[must_use]
    pub fn contains(&self, id: ParticleId) -> bool {
        self.index.contains_key(&id)
    }

    /// Ids in insertion order, captured for iteration while the arena
    /// mutates underneath.
    #[must_use]
    pub fn ids(&self) -> Vec<ParticleId> {
        self.particles.iter().map(|p| p.id).collect()
    }

    /// Mints a particle from the configured template. `None` when the
    /// population is at capacity, which callers treat as a normal outcome.
    pub fn create_particle(&mut self, species: i32) -> Option<ParticleId> {
        let template = self.config.particle.clone();
        self.create_particle_with(species, template.radius, template.mass, template.charge)
    }

    pub fn create_particle_with(
        &mut self,
        species: i32,
        radius: f32,
        mass: f32,
        charge: f32,
    ) -> Option<ParticleId> {
        if self.particles.len() >= self.config.grid.max_particles {
            return None;
        }
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        let particle = Particle::new(
            id,
            species,
            radius,
            mass,
            charge,
            self.config.particle.restitution,
        );
        self.index.insert(id, self.particles.len());
        self.particles.push(particle);
        Some(id)
    }

    /// Removes a particle and every reference to it: other particles' slots
    /// pointing at it are cleared and its strength records dropped. Unknown
    /// ids are ignored.
    pub fn remove_particle(&mut self, id: ParticleId) {
        let Some(position) = self.index.remove(&id) else {
            return;
        };
        self.particles.remove(position);
        for (i, particle) in self.particles.iter().enumerate().skip(position) {
            self.index.insert(particle.id, i);
        }
        for particle in &mut self.particles {
            for slot in &mut particle.bonds {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
        self.bonds.retain(|key, _| !key.touches(id));
    }

    /// Connects two particles through the given slots. Self-bonds and
    /// occupied slots fail; re-requesting an existing pairing succeeds
    /// without change.
    pub fn create_bond(
        &mut self,
        a: ParticleId,
        direction_a: Direction,
        b: ParticleId,
        direction_b: Direction,
        strength: f32,
    ) -> bool {
        if a == b {
            return false;
        }
        let (Some(&index_a), Some(&index_b)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        let slot_a = self.particles[index_a].bonds[direction_a.index()];
        let slot_b = self.particles[index_b].bonds[direction_b.index()];
        if slot_a == Some(b) && slot_b == Some(a) {
            return true;
        }
        if slot_a.is_some() || slot_b.is_some() {
            return false;
        }
        self.particles[index_a].bonds[direction_a.index()] = Some(b);
        self.particles[index_b].bonds[direction_b.index()] = Some(a);
        self.bonds
            .entry(BondKey::new(a, b))
            .or_insert_with(|| Bond::new(strength));
        true
    }

    /// Disconnects the bond held in one slot. The partner's first slot
    /// referencing the holder is cleared with it, and the strength record is
    /// dropped once nothing connects the pair.
    pub fn remove_bond(&mut self, id: ParticleId, direction: Direction) {
        let Some(&holder_index) = self.index.get(&id) else {
            return;
        };
        let Some(partner_id) = self.particles[holder_index].bonds[direction.index()] else {
            return;
        };
        self.particles[holder_index].bonds[direction.index()] = None;
        if let Some(&partner_index) = self.index.get(&partner_id) {
            let partner = &mut self.particles[partner_index];
            if let Some(back) = partner.bonds.iter().position(|slot| *slot == Some(id)) {
                partner.bonds[back] = None;
            }
        }
        if self.slots_between(id, partner_id) == 0 {
            self.bonds.remove(&BondKey::new(id, partner_id));
        }
    }

    /// Disconnects every slot linking the two particles, in both directions.
    pub fn remove_bond_pair(&mut self, a: ParticleId, b: ParticleId) {
        for (id, other) in [(a, b), (b, a)] {
            if let Some(&i) = self.index.get(&id) {
                for slot in &mut self.particles[i].bonds {
                    if *slot == Some(other) {
                        *slot = None;
                    }
                }
            }
        }
        self.bonds.remove(&BondKey::new(a, b));
    }

    #[must_use]
    pub fn bond_strength(&self, a: ParticleId, b: ParticleId) -> Option<f32> {
        self.bonds.get(&BondKey::new(a, b)).map(|bond| bond.strength)
    }

    fn slots_between(&self, a: ParticleId, b: ParticleId) -> usize {
        let count = |id: ParticleId, other: ParticleId| {
            self.index.get(&id).map_or(0, |&i| {
                self.particles[i]
                    .bonds
                    .iter()
                    .filter(|slot| **slot == Some(other))
                    .count()
            })
        };
        count(a, b) + count(b, a)
    }

    /// Replaces the population with loaded state. Slot cross-references in
    /// `particles` are taken as-is; the first strength record offered for a
    /// pair wins. The id counter resumes past the highest restored id.
    pub fn restore(&mut self, particles: Vec<Particle>, strengths: Vec<(BondKey, f32)>) {
        self.particles = particles;
        self.index = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        self.bonds = HashMap::new();
        for (key, strength) in strengths {
            self.bonds.entry(key).or_insert_with(|| Bond::new(strength));
        }
        self.next_id = self.particles.iter().map(|p| p.id.0 + 1).max().unwrap_or(0);
    }

    #[must_use]
    pub fn census(&self) -> Census {
        let mut by_species_state = BTreeMap::new();
        for particle in &self.particles {
            *by_species_state
                .entry((particle.species, particle.state))
                .or_insert(0) += 1;
        }
        Census {
            total: self.particles.len(),
            by_species_state,
        }
    }

    /// Advances the physics by one tick of `dt`.
    pub fn step<R: Rng>(&mut self, dt: f32, rng: &mut R) -> StepStats {
        self.integrate(dt, rng);
        let bonds_broken = self.break_overstretched();
        self.accumulate_charge_forces();
        self.accumulate_bond_forces();
        let collisions = self.detect_collisions();
        self.resolve_collisions(&collisions);
        StepStats {
            collisions: collisions.len(),
            bonds_broken,
        }
    }

    fn integrate<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        let physics = self.config.physics.clone();
        let min = self.config.grid.min_center();
        let max_x = self.config.grid.max_center_x();
        let max_y = self.config.grid.max_center_y();
        for particle in &mut self.particles {
            // Thermal agitation, gated per axis.
            for axis in 0..2 {
                if rng.gen::<f64>() < f64::from(physics.brownian_probability) {
                    let positive = rng.gen::<bool>();
                    let magnitude = rng.gen::<f32>() * physics.max_brownian_force;
                    let kick = if positive { magnitude } else { -magnitude };
                    if axis == 0 {
                        particle.force.x += kick;
                    } else {
                        particle.force.y += kick;
                    }
                }
            }

            particle.velocity += particle.force / particle.mass * dt;
            let speed = particle.velocity.mag();
            if speed > physics.max_velocity {
                particle.velocity = particle.velocity * (physics.max_velocity / speed);
            }
            particle.velocity *= 1.0 - physics.viscosity;

            // Runaways stop at the outermost cell centers.
            particle.position += particle.velocity * dt;
            particle.position.x = particle.position.x.clamp(min, max_x);
            particle.position.y = particle.position.y.clamp(min, max_y);

            particle.force = Vec2::zero();
        }
    }

    fn break_overstretched(&mut self) -> usize {
        let limit = self.config.physics.max_bond_length;
        let mut severed: HashSet<BondKey> = HashSet::new();
        for particle in &self.particles {
            for partner_id in particle.bonds.iter().flatten() {
                let Some(&partner_index) = self.index.get(partner_id) else {
                    continue;
                };
                let separation =
                    (particle.position - self.particles[partner_index].position).mag();
                if separation > limit {
                    severed.insert(BondKey::new(particle.id, *partner_id));
                }
            }
        }
        for key in &severed {
            let (a, b) = key.endpoints();
            self.remove_bond_pair(a, b);
        }
        severed.len()
    }

    /// Inverse-square electrostatics over every ordered pair. Quadratic on
    /// purpose; populations stay small enough that partitioning would buy
    /// nothing.
    fn accumulate_charge_forces(&mut self) {
        let constant = self.config.physics.charge_constant;
        let snapshot: Vec<(Vec2, f32)> = self
            .particles
            .iter()
            .map(|p| (p.position, p.charge))
            .collect();
        for (i, particle) in self.particles.iter_mut().enumerate() {
            let (position, charge) = snapshot[i];
            for (j, &(other_position, other_charge)) in snapshot.iter().enumerate() {
                if i == j {
                    continue;
                }
                let offset = position - other_position;
                let distance = offset.mag();
                if distance > 0.0 {
                    let scale = constant * charge * other_charge / (distance * distance);
                    particle.force += offset / distance * scale;
                }
            }
        }
    }

    /// Springs that pull each bonded partner toward the cell one unit away
    /// from the holder in the slot's compass direction.
    fn accumulate_bond_forces(&mut self) {
        let mut pushes: Vec<(usize, Vec2)> = Vec::new();
        for particle in &self.particles {
            for direction in Direction::ALL {
                let Some(partner_id) = particle.bonds[direction.index()] else {
                    continue;
                };
                let Some(&partner_index) = self.index.get(&partner_id) else {
                    continue;
                };
                let Some(strength) = self.bond_strength(particle.id, partner_id) else {
                    continue;
                };
                let (dx, dy) = direction.offset();
                let expected = particle.position + Vec2::new(dx as f32, dy as f32);
                let displacement = expected - self.particles[partner_index].position;
                if displacement.mag() > 0.0 {
                    pushes.push((partner_index, displacement * strength));
                }
            }
        }
        for (index, push) in pushes {
            self.particles[index].force += push;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::config::{GridConfig, PhysicsConfig};

    fn quiet_config() -> SimConfig {
        SimConfig {
            physics: PhysicsConfig {
                brownian_probability: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn place(physics: &mut Physics, id: ParticleId, x: f32, y: f32) {
        let particle = physics.particle_mut(id).unwrap();
        particle.position = Vec2::new(x, y);
    }

    #[test]
    fn test_capacity_is_a_silent_ceiling() {
        let config = SimConfig {
            grid: GridConfig {
                max_particles: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut physics = Physics::new(config);
        assert!(physics.create_particle(1).is_some());
        assert!(physics.create_particle(1).is_some());
        assert!(physics.create_particle(1).is_none());
        assert_eq!(physics.particle_count(), 2);
    }

    #[test]
    fn test_create_bond_rules() {
        let mut physics = Physics::new(SimConfig::default());
        let a = physics.create_particle(1).unwrap();
        let b = physics.create_particle(1).unwrap();
        let c = physics.create_particle(1).unwrap();

        assert!(!physics.create_bond(a, Direction::East, a, Direction::West, 0.1));
        assert!(physics.create_bond(a, Direction::East, b, Direction::West, 0.25));
        // Same pairing again is fine, a contended slot is not.
        assert!(physics.create_bond(a, Direction::East, b, Direction::West, 0.25));
        assert!(!physics.create_bond(a, Direction::East, c, Direction::West, 0.25));
        assert_eq!(physics.bond_strength(b, a), Some(0.25));
    }

    #[test]
    fn test_remove_bond_clears_both_sides() {
        let mut physics = Physics::new(SimConfig::default());
        let a = physics.create_particle(1).unwrap();
        let b = physics.create_particle(1).unwrap();
        assert!(physics.create_bond(a, Direction::North, b, Direction::South, 0.1));

        physics.remove_bond(a, Direction::North);
        assert!(physics.particle(a).unwrap().bonds.iter().all(Option::is_none));
        assert!(physics.particle(b).unwrap().bonds.iter().all(Option::is_none));
        assert_eq!(physics.bond_strength(a, b), None);
    }

    #[test]
    fn test_parallel_bonds_share_one_record() {
        let mut physics = Physics::new(SimConfig::default());
        let a = physics.create_particle(1).unwrap();
        let b = physics.create_particle(1).unwrap();
        assert!(physics.create_bond(a, Direction::North, b, Direction::South, 0.3));
        assert!(physics.create_bond(a, Direction::East, b, Direction::West, 0.9));
        assert_eq!(physics.bond_strength(a, b), Some(0.3));

        // Severing one slot pair keeps the record for the survivor.
        physics.remove_bond(a, Direction::North);
        assert_eq!(physics.bond_strength(a, b), Some(0.3));
        physics.remove_bond(a, Direction::East);
        assert_eq!(physics.bond_strength(a, b), None);
    }

    #[test]
    fn test_remove_particle_leaves_no_dangling_slots() {
        let mut physics = Physics::new(SimConfig::default());
        let a = physics.create_particle(1).unwrap();
        let b = physics.create_particle(1).unwrap();
        let c = physics.create_particle(1).unwrap();
        assert!(physics.create_bond(a, Direction::East, b, Direction::West, 0.1));
        assert!(physics.create_bond(c, Direction::North, b, Direction::South, 0.1));

        physics.remove_particle(b);
        assert!(!physics.contains(b));
        for id in [a, c] {
            let particle = physics.particle(id).unwrap();
            assert!(particle.bonds.iter().all(Option::is_none));
        }
        assert_eq!(physics.bond_strength(a, b), None);
        assert_eq!(physics.ids(), vec![a, c]);
    }

    #[test]
    fn test_velocity_ceiling_and_viscosity() {
        let mut physics = Physics::new(quiet_config());
        let id = physics.create_particle(1).unwrap();
        place(&mut physics, id, 10.5, 10.5);
        physics.particle_mut(id).unwrap().velocity = Vec2::new(3.0, 4.0);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        physics.step(1.0, &mut rng);

        let particle = physics.particle(id).unwrap();
        // Clamped to 0.5 then damped by 10 percent.
        assert!((particle.velocity.mag() - 0.45).abs() < 1e-4);
    }

    #[test]
    fn test_positions_clamp_to_outermost_cell_centers() {
        let mut physics = Physics::new(quiet_config());
        let id = physics.create_particle(1).unwrap();
        place(&mut physics, id, 19.4, 0.6);
        physics.particle_mut(id).unwrap().velocity = Vec2::new(5.0, -5.0);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        physics.step(1.0, &mut rng);

        let particle = physics.particle(id).unwrap();
        assert!((particle.position.x - 19.5).abs() < f32::EPSILON);
        assert!((particle.position.y - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overstretched_bonds_tear_symmetrically() {
        let mut physics = Physics::new(quiet_config());
        let a = physics.create_particle(1).unwrap();
        let b = physics.create_particle(1).unwrap();
        place(&mut physics, a, 2.5, 2.5);
        place(&mut physics, b, 3.5, 2.5);
        assert!(physics.create_bond(a, Direction::East, b, Direction::West, 0.1));

        place(&mut physics, b, 9.5, 2.5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let stats = physics.step(1.0, &mut rng);

        assert_eq!(stats.bonds_broken, 1);
        assert!(physics.particle(a).unwrap().bonds.iter().all(Option::is_none));
        assert!(physics.particle(b).unwrap().bonds.iter().all(Option::is_none));
        assert_eq!(physics.bond_strength(a, b), None);
    }

    #[test]
    fn test_opposite_charges_attract_equally() {
        let mut physics = Physics::new(quiet_config());
        let a = physics
            .create_particle_with(1, 0.5, 1.0, 1.0)
            .unwrap();
        let b = physics
            .create_particle_with(1, 0.5, 1.0, -1.0)
            .unwrap();
        place(&mut physics, a, 2.5, 2.5);
        place(&mut physics, b, 6.5, 2.5);

        physics.accumulate_charge_forces();

        // Separation 4, so each magnitude is 1/16, pointed at the other.
        let force_a = physics.particle(a).unwrap().force;
        let force_b = physics.particle(b).unwrap().force;
        assert!((force_a.x - 0.0625).abs() < 1e-6);
        assert!((force_a.x + force_b.x).abs() < 1e-6);
        assert!((force_a.y).abs() < 1e-6 && (force_b.y).abs() < 1e-6);
    }

    #[test]
    fn test_bond_spring_pulls_partner_toward_expected_cell() {
        let mut physics = Physics::new(quiet_config());
        let holder = physics.create_particle(1).unwrap();
        let partner = physics.create_particle(1).unwrap();
        place(&mut physics, holder, 5.5, 5.5);
        place(&mut physics, partner, 7.5, 5.5);
        assert!(physics.create_bond(holder, Direction::East, partner, Direction::West, 0.2));

        physics.accumulate_bond_forces();

        // Expected seat is (6.5, 5.5); the partner sits one cell too far east.
        let force = physics.particle(partner).unwrap().force;
        assert!((force.x + 0.2).abs() < 1e-6);
        assert!(force.y.abs() < 1e-6);
        // Spring forces act on the partner, not the holder.
        let holder_force = physics.particle(holder).unwrap().force;
        assert!(holder_force.x.abs() < 1e-6);
    }

    #[test]
    fn test_restore_resumes_id_counter() {
        let mut physics = Physics::new(SimConfig::default());
        let template = physics.config().particle.clone();
        let mut first = Particle::new(
            ParticleId(7),
            3,
            template.radius,
            template.mass,
            template.charge,
            template.restitution,
        );
        first.position = Vec2::new(4.5, 4.5);
        physics.restore(vec![first], Vec::new());

        let next = physics.create_particle(1).unwrap();
        assert_eq!(next, ParticleId(8));
        assert_eq!(physics.particle_count(), 2);
    }

    #[test]
    fn test_census_groups_by_species_and_state() {
        let mut physics = Physics::new(SimConfig::default());
        let a = physics.create_particle(1).unwrap();
        let _ = physics.create_particle(1).unwrap();
        let _ = physics.create_particle(2).unwrap();
        physics.particle_mut(a).unwrap().state = 4;

        let census = physics.census();
        assert_eq!(census.total, 3);
        assert_eq!(census.count(1, 4), 1);
        assert_eq!(census.count(1, 0), 1);
        assert_eq!(census.count(2, 0), 1);
        assert_eq!(census.count(9, 0), 0);
    }

    #[test]
    fn test_cell_center_truncates_toward_zero() {
        assert!((cell_center(0.0) - 0.5).abs() < f32::EPSILON);
        assert!((cell_center(3.9) - 3.5).abs() < f32::EPSILON);
        assert!((cell_center(19.0) - 19.5).abs() < f32::EPSILON);
    }
}
