//! Oriented 3×3 neighborhood construction and addressing.
//!
//! Reaction patterns are written in the focal particle's frame, with pattern
//! north aligned to the particle's facing. This module buckets nearby
//! particles into the Moore neighborhood of the focal cell and translates
//! pattern coordinates into absolute bucket coordinates through the focal
//! orientation.

use protobiont_data::{Direction, Orientation, Particle, ParticleId};

use crate::physics::Physics;

/// Skew maps from pattern offsets to absolute offsets, one 2x2 integer
/// matrix `[a, b, c, d]` per facing: `(x, y) -> (a*x + b*y, c*x + d*y)`.
/// North is the identity and south the point reflection; the six remaining
/// facings shear the window so oblique rotations stay inside it.
const SKEW: [[i32; 4]; 8] = [
    [1, 0, 0, 1],    // north
    [1, 1, -1, 1],   // northeast
    [0, 1, -1, 0],   // east
    [-1, 1, -1, -1], // southeast
    [-1, 0, 0, -1],  // south
    [-1, -1, 1, -1], // southwest
    [0, -1, 1, 0],   // west
    [1, -1, 1, 1],   // northwest
];

/// Absolute cell offset addressed by a pattern offset under `orientation`.
///
/// Mirrored orientations reflect the facing across the north-south axis
/// before the skew is applied. Outputs are compacted to the Chebyshev radius
/// of the input, so a 3x3 window can never address outside a 3x3 window.
#[must_use]
pub fn cell_location(orientation: Orientation, x: i32, y: i32) -> (i32, i32) {
    let facing = if orientation.mirrored {
        orientation.direction.reflected()
    } else {
        orientation.direction
    };
    let m = SKEW[facing.index()];
    let sx = m[0] * x + m[1] * y;
    let sy = m[2] * x + m[3] * y;
    let radius = x.abs().max(y.abs());
    (sx.clamp(-radius, radius), sy.clamp(-radius, radius))
}

/// Offset from a ring cell to the cell reached by stepping `steps` around
/// the neighborhood ring. Mirrored steps walk counterclockwise. The center
/// cell steps nowhere. Used when constructing rule tables, not during
/// matching.
#[must_use]
pub fn ring_step(x: i32, y: i32, steps: Orientation) -> (i32, i32) {
    debug_assert!((-1..=1).contains(&x) && (-1..=1).contains(&y));
    let Some(from) = ring_direction(x, y) else {
        return (0, 0);
    };
    let to = Orientation::new(from, steps.mirrored).aim(steps.direction.index() as i32);
    let (fx, fy) = from.offset();
    let (tx, ty) = to.offset();
    (tx - fx, ty - fy)
}

fn ring_direction(x: i32, y: i32) -> Option<Direction> {
    match (x, y) {
        (0, 1) => Some(Direction::North),
        (1, 1) => Some(Direction::Northeast),
        (1, 0) => Some(Direction::East),
        (1, -1) => Some(Direction::Southeast),
        (0, -1) => Some(Direction::South),
        (-1, -1) => Some(Direction::Southwest),
        (-1, 0) => Some(Direction::West),
        (-1, 1) => Some(Direction::Northwest),
        _ => None,
    }
}

/// The 3x3 cell buckets around one focal particle, captured at the start of
/// that particle's reaction scan.
#[derive(Debug)]
pub struct Neighborhood {
    /// Indexed `[column][row]`, west to east and south to north.
    cells: [[Vec<ParticleId>; 3]; 3],
    orientation: Orientation,
    focal: ParticleId,
}

impl Neighborhood {
    /// Buckets every particle near `focal` by comparing positions against
    /// half-integer boundaries around the focal cell. The center bucket
    /// holds the focal particle alone; other particles sharing its cell are
    /// not neighborhood members.
    #[must_use]
    pub fn around(physics: &Physics, focal: &Particle) -> Self {
        let mut cells: [[Vec<ParticleId>; 3]; 3] = Default::default();
        cells[1][1].push(focal.id);
        for particle in physics.particles() {
            if particle.id == focal.id {
                continue;
            }
            let Some(column) = bucket_index(particle.position.x, focal.position.x) else {
                continue;
            };
            let Some(row) = bucket_index(particle.position.y, focal.position.y) else {
                continue;
            };
            if column == 1 && row == 1 {
                continue;
            }
            cells[column][row].push(particle.id);
        }
        Self {
            cells,
            orientation: focal.orientation,
            focal: focal.id,
        }
    }

    #[must_use]
    pub fn focal(&self) -> ParticleId {
        self.focal
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Absolute bucket coordinates for a pattern cell, both in `0..3`.
    #[must_use]
    pub fn resolve(&self, x: usize, y: usize) -> (usize, usize) {
        let (ax, ay) = cell_location(self.orientation, x as i32 - 1, y as i32 - 1);
        ((ax + 1) as usize, (ay + 1) as usize)
    }

    /// Bucket contents addressed by pattern coordinates.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> &[ParticleId] {
        let (ax, ay) = self.resolve(x, y);
        &self.cells[ax][ay]
    }
}

fn bucket_index(position: f32, center: f32) -> Option<usize> {
    if position >= center - 1.5 && position < center - 0.5 {
        Some(0)
    } else if position >= center - 0.5 && position < center + 0.5 {
        Some(1)
    } else if position >= center + 0.5 && position < center + 1.5 {
        Some(2)
    } else {
        None
    }
}
