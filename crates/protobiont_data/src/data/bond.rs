use serde::{Deserialize, Serialize};

use super::particle::ParticleId;

/// Spring strength record shared by the two endpoint slots of a bonded
/// pair. Owned by the physics bond table, never by a particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub strength: f32,
}

impl Bond {
    /// Spring strength used when no explicit strength is given.
    pub const DEFAULT_STRENGTH: f32 = 0.1;

    #[must_use]
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

/// Unordered particle-id pair keying the bond table. Construction sorts the
/// endpoints so `(a, b)` and `(b, a)` address the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondKey {
    low: ParticleId,
    high: ParticleId,
}

impl BondKey {
    #[must_use]
    pub fn new(a: ParticleId, b: ParticleId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    #[must_use]
    pub fn endpoints(self) -> (ParticleId, ParticleId) {
        (self.low, self.high)
    }

    #[must_use]
    pub fn touches(self, id: ParticleId) -> bool {
        self.low == id || self.high == id
    }
}
