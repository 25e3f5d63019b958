//! Collision detection and impulse resolution.
//!
//! Contacts are found in one full pass over committed positions, recorded,
//! then resolved as impulses into the force accumulators. Records never
//! outlive the tick that produced them.

use ultraviolet::Vec2;

use protobiont_data::{Particle, ParticleId};

use crate::physics::Physics;

/// One detected contact between two particle disks.
#[derive(Debug, Clone, Copy)]
pub struct Collision {
    pub first: ParticleId,
    pub second: ParticleId,
    /// Unit vector from the second particle toward the first.
    pub normal: Vec2,
    pub point: Vec2,
    /// Velocity of the first particle relative to the second.
    pub relative_velocity: Vec2,
}

impl Physics {
    /// Pairs up particles whose disks overlap while approaching each other.
    /// A particle joins at most one contact per tick; scanning its partners
    /// stops at the first hit, and marked particles are skipped thereafter.
    pub(crate) fn detect_collisions(&mut self) -> Vec<Collision> {
        for particle in &mut self.particles {
            particle.collided = None;
        }
        let mut collisions = Vec::new();
        for i in 0..self.particles.len() {
            if self.particles[i].collided.is_some() {
                continue;
            }
            for j in 0..self.particles.len() {
                if i == j || self.particles[j].collided.is_some() {
                    continue;
                }
                let offset = self.particles[i].position - self.particles[j].position;
                let distance = offset.mag();
                let reach = self.particles[i].radius + self.particles[j].radius;
                if distance >= reach || distance <= 0.0 {
                    continue;
                }
                let normal = offset / distance;
                let relative_velocity = self.particles[i].velocity - self.particles[j].velocity;
                if relative_velocity.dot(normal) < 0.0 {
                    let (first, second) = (self.particles[i].id, self.particles[j].id);
                    self.particles[i].collided = Some(second);
                    self.particles[j].collided = Some(first);
                    collisions.push(Collision {
                        first,
                        second,
                        normal,
                        point: normal * self.particles[i].radius + self.particles[i].position,
                        relative_velocity,
                    });
                    break;
                }
            }
        }
        collisions
    }

    /// Applies each contact's impulse to both force accumulators.
    pub(crate) fn resolve_collisions(&mut self, collisions: &[Collision]) {
        for collision in collisions {
            let (Some(&i), Some(&j)) = (
                self.index.get(&collision.first),
                self.index.get(&collision.second),
            ) else {
                continue;
            };
            let impulse = impulse_magnitude(collision, &self.particles[i], &self.particles[j]);
            self.particles[i].force += collision.normal * impulse;
            self.particles[j].force -= collision.normal * impulse;
        }
    }
}

/// Impulse along the contact normal for a rigid collision with averaged
/// restitution. The contact point sits on the line of centers, so the
/// angular terms contribute only rounding noise, but the full rigid-body
/// expression is kept.
fn impulse_magnitude(collision: &Collision, first: &Particle, second: &Particle) -> f32 {
    let restitution = (first.restitution + second.restitution) / 2.0;
    let arm_first = collision.point - first.position;
    let arm_second = collision.point - second.position;
    let spin_first = cross(arm_first, collision.normal);
    let spin_second = cross(arm_second, collision.normal);
    let denominator = 1.0 / first.mass
        + 1.0 / second.mass
        + spin_first * spin_first * first.inverse_inertia()
        + spin_second * spin_second * second.inverse_inertia();
    if denominator <= 0.0 {
        return 0.0;
    }
    -(1.0 + restitution) * collision.relative_velocity.dot(collision.normal) / denominator
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::{PhysicsConfig, SimConfig};

    fn quiet_config() -> SimConfig {
        SimConfig {
            physics: PhysicsConfig {
                brownian_probability: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn moving_particle(physics: &mut Physics, x: f32, y: f32, vx: f32, vy: f32) -> ParticleId {
        let id = physics.create_particle(1).unwrap();
        let particle = physics.particle_mut(id).unwrap();
        particle.position = Vec2::new(x, y);
        particle.velocity = Vec2::new(vx, vy);
        id
    }

    #[test]
    fn test_head_on_elastic_impulse_reverses_approach() {
        let mut physics = Physics::new(quiet_config());
        let a = moving_particle(&mut physics, 5.0, 5.0, 0.5, 0.0);
        let b = moving_particle(&mut physics, 5.9, 5.0, -0.5, 0.0);

        let contacts = physics.detect_collisions();
        assert_eq!(contacts.len(), 1);
        physics.resolve_collisions(&contacts);

        // Unit masses and restitution, so the impulse equals the closing
        // speed and the post-integration approach velocity flips sign.
        let force_a = physics.particle(a).unwrap().force;
        let force_b = physics.particle(b).unwrap().force;
        assert!((force_a.x + 1.0).abs() < 1e-5);
        assert!((force_b.x - 1.0).abs() < 1e-5);
        let separating = (Vec2::new(0.5, 0.0) + force_a) - (Vec2::new(-0.5, 0.0) + force_b);
        assert!((separating.x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_receding_particles_do_not_collide() {
        let mut physics = Physics::new(quiet_config());
        moving_particle(&mut physics, 5.0, 5.0, -0.5, 0.0);
        moving_particle(&mut physics, 5.9, 5.0, 0.5, 0.0);

        assert!(physics.detect_collisions().is_empty());
    }

    #[test]
    fn test_one_contact_per_particle_per_tick() {
        let mut physics = Physics::new(quiet_config());
        let a = moving_particle(&mut physics, 5.0, 5.0, 0.5, 0.0);
        let b = moving_particle(&mut physics, 5.8, 5.0, -0.5, 0.0);
        let c = moving_particle(&mut physics, 6.6, 5.0, -0.5, 0.0);

        let contacts = physics.detect_collisions();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first, a);
        assert_eq!(contacts[0].second, b);
        assert!(physics.particle(c).unwrap().collided.is_none());
    }

    #[test]
    fn test_stacked_particles_are_ignored() {
        let mut physics = Physics::new(quiet_config());
        moving_particle(&mut physics, 5.0, 5.0, 0.1, 0.0);
        moving_particle(&mut physics, 5.0, 5.0, -0.1, 0.0);

        assert!(physics.detect_collisions().is_empty());
    }

    #[test]
    fn test_unequal_masses_split_the_impulse() {
        let mut physics = Physics::new(quiet_config());
        let heavy = physics.create_particle_with(1, 0.5, 3.0, 0.0).unwrap();
        let light = physics.create_particle_with(1, 0.5, 1.0, 0.0).unwrap();
        {
            let particle = physics.particle_mut(heavy).unwrap();
            particle.position = Vec2::new(5.0, 5.0);
            particle.velocity = Vec2::new(0.5, 0.0);
        }
        {
            let particle = physics.particle_mut(light).unwrap();
            particle.position = Vec2::new(5.9, 5.0);
            particle.velocity = Vec2::new(-0.5, 0.0);
        }

        let contacts = physics.detect_collisions();
        physics.resolve_collisions(&contacts);

        // Impulse = 2 * closing speed / (1/3 + 1) = 1.5 for unit restitution.
        let force_heavy = physics.particle(heavy).unwrap().force;
        assert!((force_heavy.x + 1.5).abs() < 1e-5);
    }
}
