//! The replicator molecule experiment.
//!
//! A replicator is an eight-particle ladder: a left strand A-B-C-D and a
//! right strand W-X-Y-Z, bonded down each strand and across each rung. A
//! catalyst particle walks down the left strand, unzipping the rungs; the
//! freed strand halves then re-bond free components into two complete
//! ladders. The reaction table encodes that walk as catalyst presentation,
//! handoff between strand neighbors, rung unbonding and re-bonding.

use rand::Rng;
use tracing::warn;

use protobiont_core::{Bond, Census, Direction, Physics, Reaction, ReactionKind, SpeciesRule};
use ultraviolet::Vec2;

/// Particle species of the experiment.
pub mod species {
    pub const A: i32 = 0;
    pub const B: i32 = 1;
    pub const C: i32 = 2;
    pub const D: i32 = 3;
    pub const W: i32 = 4;
    pub const X: i32 = 5;
    pub const Y: i32 = 6;
    pub const Z: i32 = 7;
    pub const CATALYST: i32 = 8;

    /// Strand component species, excluding the catalyst.
    pub const COMPONENTS: [i32; 8] = [A, B, C, D, W, X, Y, Z];

    pub fn label(species: i32) -> char {
        match species {
            A => 'A',
            B => 'B',
            C => 'C',
            D => 'D',
            W => 'W',
            X => 'X',
            Y => 'Y',
            Z => 'Z',
            CATALYST => '*',
            _ => '?',
        }
    }
}

/// Particle states of the experiment.
pub mod state {
    pub const FREE: i32 = 0;
    pub const BONDED: i32 = 1;
    pub const HANDOFF: i32 = 2;
    pub const UNBONDED: i32 = 3;
}

const MAX_PLACEMENT_TRIES: usize = 1000;

/// Fluent construction for the rule table below; rules read top to bottom
/// the way the pattern sits on the grid.
struct Rule(Reaction);

impl Rule {
    fn new(description: &str, kind: ReactionKind) -> Self {
        Self(Reaction::new(description, kind))
    }

    fn species(mut self, x: usize, y: usize, species: i32) -> Self {
        self.0.set_species(x, y, SpeciesRule::Is(species));
        self
    }

    fn state(mut self, x: usize, y: usize, state: i32) -> Self {
        self.0.set_state(x, y, state);
        self
    }

    fn target(mut self, x: usize, y: usize) -> Self {
        self.0.set_target(x, y);
        self
    }

    fn source_state(mut self, state: i32) -> Self {
        self.0.source_state = Some(state);
        self
    }

    fn target_state(mut self, state: i32) -> Self {
        self.0.target_state = Some(state);
        self
    }

    fn source_bond(mut self, direction: Direction) -> Self {
        self.0.source_bond = direction;
        self
    }

    fn target_bond(mut self, direction: Direction) -> Self {
        self.0.target_bond = direction;
        self
    }

    fn build(self) -> Reaction {
        self.0
    }
}

/// The full replication rule table, in match-priority order.
///
/// The left strand (A through D) sees the catalyst to its west and hands it
/// south; the right strand (W through Z) mirrors that with the catalyst to
/// its east. Each strand particle runs the same five-beat cycle: present
/// the catalyst to the neighbor below, hand it off, unbond from its rung
/// partner, bond a free partner from the far side, then re-bond to the
/// neighbor below.
#[must_use]
pub fn reactions() -> Vec<Reaction> {
    use species::{A, B, C, CATALYST, D, W, X, Y, Z};
    use state::{BONDED, FREE, HANDOFF, UNBONDED};
    use Direction::{East, North, Northeast, Northwest, South, Southeast, Southwest, West};
    use ReactionKind::{Bond, Unbond};

    vec![
        // Particle A.
        Rule::new("A presents catalyst to B", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, A)
            .state(1, 1, BONDED)
            .target(0, 1)
            .source_state(HANDOFF)
            .source_bond(Southwest)
            .target_bond(Northeast)
            .build(),
        Rule::new("A hands catalyst off to B", Unbond)
            .species(0, 0, CATALYST)
            .species(1, 1, A)
            .species(1, 0, B)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southwest)
            .build(),
        Rule::new("A unbonds from W", Unbond)
            .species(1, 1, A)
            .species(2, 1, W)
            .state(1, 1, UNBONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("bonded A unbonds from freed W", Unbond)
            .species(1, 1, A)
            .species(2, 1, W)
            .state(1, 1, BONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(East)
            .build(),
        Rule::new("A bonds a free W", Bond)
            .species(1, 1, A)
            .species(2, 1, W)
            .species(1, 0, B)
            .state(1, 1, UNBONDED)
            .state(2, 1, FREE)
            .state(1, 0, BONDED)
            .target(2, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("A re-bonds to B", Bond)
            .species(1, 1, A)
            .species(1, 0, B)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle B.
        Rule::new("B takes catalyst presented by A", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, B)
            .species(1, 2, A)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(0, 1)
            .source_state(HANDOFF)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("B presents catalyst to C", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, B)
            .species(1, 2, A)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(0, 1)
            .source_bond(Southwest)
            .target_bond(Northeast)
            .build(),
        Rule::new("B releases catalyst taken from A", Unbond)
            .species(0, 1, CATALYST)
            .species(1, 1, B)
            .species(1, 2, A)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("B hands catalyst off to C", Unbond)
            .species(0, 0, CATALYST)
            .species(1, 1, B)
            .species(1, 0, C)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southwest)
            .build(),
        Rule::new("B unbonds from X", Unbond)
            .species(1, 1, B)
            .species(2, 1, X)
            .state(1, 1, UNBONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("bonded B unbonds from freed X", Unbond)
            .species(1, 1, B)
            .species(2, 1, X)
            .state(1, 1, BONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(East)
            .build(),
        Rule::new("B bonds a free X", Bond)
            .species(1, 1, B)
            .species(2, 1, X)
            .species(1, 0, C)
            .state(1, 1, UNBONDED)
            .state(2, 1, FREE)
            .state(1, 0, BONDED)
            .target(2, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("B re-bonds to C", Bond)
            .species(1, 1, B)
            .species(1, 0, C)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle C.
        Rule::new("C takes catalyst presented by B", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, C)
            .species(1, 2, B)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(0, 1)
            .source_state(HANDOFF)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("C presents catalyst to D", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, C)
            .species(1, 2, B)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(0, 1)
            .source_bond(Southwest)
            .target_bond(Northeast)
            .build(),
        Rule::new("C releases catalyst taken from B", Unbond)
            .species(0, 1, CATALYST)
            .species(1, 1, C)
            .species(1, 2, B)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("C hands catalyst off to D", Unbond)
            .species(0, 0, CATALYST)
            .species(1, 1, C)
            .species(1, 0, D)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southwest)
            .build(),
        Rule::new("C unbonds from Y", Unbond)
            .species(1, 1, C)
            .species(2, 1, Y)
            .state(1, 1, UNBONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("bonded C unbonds from freed Y", Unbond)
            .species(1, 1, C)
            .species(2, 1, Y)
            .state(1, 1, BONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(East)
            .build(),
        Rule::new("C bonds a free Y", Bond)
            .species(1, 1, C)
            .species(2, 1, Y)
            .species(1, 0, D)
            .state(1, 1, UNBONDED)
            .state(2, 1, FREE)
            .state(1, 0, BONDED)
            .target(2, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("C re-bonds to D", Bond)
            .species(1, 1, C)
            .species(1, 0, D)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle D.
        Rule::new("D takes catalyst presented by C", Bond)
            .species(0, 1, CATALYST)
            .species(1, 1, D)
            .species(1, 2, C)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(0, 1)
            .source_state(HANDOFF)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("D releases catalyst after C lets go", Unbond)
            .species(0, 1, CATALYST)
            .species(1, 1, D)
            .species(1, 2, C)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(West)
            .build(),
        Rule::new("D unbonds from Z", Unbond)
            .species(1, 1, D)
            .species(2, 1, Z)
            .state(1, 1, UNBONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("bonded D unbonds from freed Z", Unbond)
            .species(1, 1, D)
            .species(2, 1, Z)
            .state(1, 1, BONDED)
            .state(2, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(East)
            .build(),
        Rule::new("D bonds a free Z", Bond)
            .species(1, 1, D)
            .species(2, 1, Z)
            .state(1, 1, UNBONDED)
            .state(2, 1, FREE)
            .target(2, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(East)
            .target_bond(West)
            .build(),
        // Particle W.
        Rule::new("W presents catalyst to X", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, W)
            .state(1, 1, BONDED)
            .target(2, 1)
            .source_state(HANDOFF)
            .source_bond(Southeast)
            .target_bond(Northwest)
            .build(),
        Rule::new("W hands catalyst off to X", Unbond)
            .species(2, 0, CATALYST)
            .species(1, 1, W)
            .species(1, 0, X)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southeast)
            .build(),
        Rule::new("W unbonds from A", Unbond)
            .species(1, 1, W)
            .species(0, 1, A)
            .state(1, 1, UNBONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("bonded W unbonds from freed A", Unbond)
            .species(1, 1, W)
            .species(0, 1, A)
            .state(1, 1, BONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(West)
            .build(),
        Rule::new("W bonds a free A", Bond)
            .species(1, 1, W)
            .species(0, 1, A)
            .species(1, 0, X)
            .state(1, 1, UNBONDED)
            .state(0, 1, FREE)
            .state(1, 0, BONDED)
            .target(0, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("W re-bonds to X", Bond)
            .species(1, 1, W)
            .species(1, 0, X)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle X.
        Rule::new("X takes catalyst presented by W", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, X)
            .species(1, 2, W)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(2, 1)
            .source_state(HANDOFF)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("X presents catalyst to Y", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, X)
            .species(1, 2, W)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(2, 1)
            .source_bond(Southeast)
            .target_bond(Northwest)
            .build(),
        Rule::new("X releases catalyst taken from W", Unbond)
            .species(2, 1, CATALYST)
            .species(1, 1, X)
            .species(1, 2, W)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("X hands catalyst off to Y", Unbond)
            .species(2, 0, CATALYST)
            .species(1, 1, X)
            .species(1, 0, Y)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southeast)
            .build(),
        Rule::new("X unbonds from B", Unbond)
            .species(1, 1, X)
            .species(0, 1, B)
            .state(1, 1, UNBONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("bonded X unbonds from freed B", Unbond)
            .species(1, 1, X)
            .species(0, 1, B)
            .state(1, 1, BONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(West)
            .build(),
        Rule::new("X bonds a free B", Bond)
            .species(1, 1, X)
            .species(0, 1, B)
            .species(1, 0, Y)
            .state(1, 1, UNBONDED)
            .state(0, 1, FREE)
            .state(1, 0, BONDED)
            .target(0, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("X re-bonds to Y", Bond)
            .species(1, 1, X)
            .species(1, 0, Y)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle Y.
        Rule::new("Y takes catalyst presented by X", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, Y)
            .species(1, 2, X)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(2, 1)
            .source_state(HANDOFF)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("Y presents catalyst to Z", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, Y)
            .species(1, 2, X)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(2, 1)
            .source_bond(Southeast)
            .target_bond(Northwest)
            .build(),
        Rule::new("Y releases catalyst taken from X", Unbond)
            .species(2, 1, CATALYST)
            .species(1, 1, Y)
            .species(1, 2, X)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_bond(East)
            .build(),
        Rule::new("Y hands catalyst off to Z", Unbond)
            .species(2, 0, CATALYST)
            .species(1, 1, Y)
            .species(1, 0, Z)
            .state(1, 1, HANDOFF)
            .state(1, 0, HANDOFF)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(Southeast)
            .build(),
        Rule::new("Y unbonds from C", Unbond)
            .species(1, 1, Y)
            .species(0, 1, C)
            .state(1, 1, UNBONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("bonded Y unbonds from freed C", Unbond)
            .species(1, 1, Y)
            .species(0, 1, C)
            .state(1, 1, BONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(West)
            .build(),
        Rule::new("Y bonds a free C", Bond)
            .species(1, 1, Y)
            .species(0, 1, C)
            .species(1, 0, Z)
            .state(1, 1, UNBONDED)
            .state(0, 1, FREE)
            .state(1, 0, BONDED)
            .target(0, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(West)
            .target_bond(East)
            .build(),
        Rule::new("Y re-bonds to Z", Bond)
            .species(1, 1, Y)
            .species(1, 0, Z)
            .state(1, 1, BONDED)
            .state(1, 0, BONDED)
            .target(1, 0)
            .source_bond(South)
            .target_bond(North)
            .build(),
        // Particle Z.
        Rule::new("Z takes catalyst presented by Y", Bond)
            .species(2, 1, CATALYST)
            .species(1, 1, Z)
            .species(1, 2, Y)
            .state(1, 1, BONDED)
            .state(1, 2, HANDOFF)
            .target(2, 1)
            .source_state(HANDOFF)
            .source_bond(East)
            .target_bond(West)
            .build(),
        Rule::new("Z releases catalyst after Y lets go", Unbond)
            .species(2, 1, CATALYST)
            .species(1, 1, Z)
            .species(1, 2, Y)
            .state(1, 1, HANDOFF)
            .state(1, 2, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(East)
            .build(),
        Rule::new("Z unbonds from D", Unbond)
            .species(1, 1, Z)
            .species(0, 1, D)
            .state(1, 1, UNBONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_bond(West)
            .build(),
        Rule::new("bonded Z unbonds from freed D", Unbond)
            .species(1, 1, Z)
            .species(0, 1, D)
            .state(1, 1, BONDED)
            .state(0, 1, UNBONDED)
            .target(1, 1)
            .source_state(UNBONDED)
            .source_bond(West)
            .build(),
        Rule::new("Z bonds a free D", Bond)
            .species(1, 1, Z)
            .species(0, 1, D)
            .state(1, 1, UNBONDED)
            .state(0, 1, FREE)
            .target(0, 1)
            .source_state(BONDED)
            .target_state(BONDED)
            .source_bond(West)
            .target_bond(East)
            .build(),
    ]
}

/// Occupancy map used while scattering molecules over the grid.
struct PlaceMap {
    width: usize,
    height: usize,
    taken: Vec<bool>,
}

impl PlaceMap {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            taken: vec![false; width * height],
        }
    }

    fn is_free(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && !self.taken[y * self.width + x]
    }

    fn take(&mut self, x: usize, y: usize) {
        self.taken[y * self.width + x] = true;
    }
}

/// Builds a bonded eight-particle ladder with its A corner at `(x, y)`.
/// Returns false when the population cap stops construction partway.
fn place_octet(physics: &mut Physics, x: usize, y: usize) -> bool {
    use species::{A, B, C, D, W, X, Y, Z};

    let mut ids = [None; 8];
    for (i, &(species, column, drop)) in [
        (A, 0, 0),
        (B, 0, 1),
        (C, 0, 2),
        (D, 0, 3),
        (W, 1, 0),
        (X, 1, 1),
        (Y, 1, 2),
        (Z, 1, 3),
    ]
    .iter()
    .enumerate()
    {
        let Some(id) = physics.create_particle(species) else {
            return false;
        };
        let particle = physics.particle_mut(id).expect("just created");
        particle.state = state::BONDED;
        particle.position = Vec2::new((x + column) as f32 + 0.5, (y - drop) as f32 + 0.5);
        ids[i] = Some(id);
    }
    let ids = ids.map(|id| id.expect("all eight created"));
    let [a, b, c, d, w, xx, yy, z] = ids;

    // Down each strand, then across the rungs.
    let strength = Bond::DEFAULT_STRENGTH;
    for (upper, lower) in [(a, b), (b, c), (c, d), (w, xx), (xx, yy), (yy, z)] {
        physics.create_bond(upper, Direction::South, lower, Direction::North, strength);
    }
    for (left, right) in [(a, w), (b, xx), (c, yy), (d, z)] {
        physics.create_bond(left, Direction::East, right, Direction::West, strength);
    }
    true
}

/// Scatters the starting population: bonded replicator ladders, lone
/// catalysts and free components at random unoccupied cells. Stops quietly
/// when placement tries or the population cap run out.
pub fn seed_population<R: Rng>(
    physics: &mut Physics,
    replicators: usize,
    catalysts: usize,
    components: usize,
    rng: &mut R,
) {
    let width = physics.config().grid.width as usize;
    let height = physics.config().grid.height as usize;
    // Placement draws x from [0, width-1) and y from [3, height).
    if width < 2 || height < 4 {
        warn!(width, height, "grid too small to place any molecules");
        return;
    }
    let mut map = PlaceMap::new(width, height);

    'replicators: for _ in 0..replicators {
        for _ in 0..MAX_PLACEMENT_TRIES {
            let x = rng.gen_range(0..width - 1);
            let y = rng.gen_range(3..height);
            let footprint_free = (0..4).all(|drop| {
                map.is_free(x, y - drop) && map.is_free(x + 1, y - drop)
            });
            if footprint_free {
                for drop in 0..4 {
                    map.take(x, y - drop);
                    map.take(x + 1, y - drop);
                }
                if !place_octet(physics, x, y) {
                    warn!("population cap reached while seeding replicators");
                    break 'replicators;
                }
                continue 'replicators;
            }
        }
        warn!("no room left for another replicator");
        break;
    }

    for _ in 0..catalysts {
        if let Some((x, y)) = find_free_cell(&mut map, rng) {
            let Some(id) = physics.create_particle(species::CATALYST) else {
                warn!("population cap reached while seeding catalysts");
                break;
            };
            physics.particle_mut(id).expect("just created").position =
                Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        } else {
            break;
        }
    }

    for _ in 0..components {
        if let Some((x, y)) = find_free_cell(&mut map, rng) {
            let species = species::COMPONENTS[rng.gen_range(0..species::COMPONENTS.len())];
            let Some(id) = physics.create_particle(species) else {
                warn!("population cap reached while seeding components");
                break;
            };
            let particle = physics.particle_mut(id).expect("just created");
            particle.state = state::FREE;
            particle.position = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        } else {
            break;
        }
    }
}

fn find_free_cell<R: Rng>(map: &mut PlaceMap, rng: &mut R) -> Option<(usize, usize)> {
    for _ in 0..MAX_PLACEMENT_TRIES {
        let x = rng.gen_range(0..map.width - 1);
        let y = rng.gen_range(3..map.height);
        if map.is_free(x, y) {
            map.take(x, y);
            return Some((x, y));
        }
    }
    warn!("no room left for another particle");
    None
}

/// Molecule-level census: intact ladders versus loose left strands, both
/// counted through their A particle's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoleculeReport {
    pub replicators: usize,
    pub strands: usize,
}

#[must_use]
pub fn molecule_report(census: &Census) -> MoleculeReport {
    MoleculeReport {
        replicators: census.count(species::A, state::BONDED),
        strands: census.count(species::A, state::UNBONDED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use protobiont_core::config::GridConfig;
    use protobiont_core::SimConfig;

    #[test]
    fn test_reaction_table_shape() {
        let table = reactions();
        assert_eq!(table.len(), 54);
        // Every rule constrains its target cell by species, so the effect
        // loop always has a concrete species filter.
        for rule in &table {
            assert!(
                matches!(rule.target_species(), SpeciesRule::Is(_)),
                "rule \"{}\" has an unconstrained target",
                rule.description
            );
        }
    }

    #[test]
    fn test_seeding_builds_complete_ladders() {
        let mut physics = Physics::new(SimConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        seed_population(&mut physics, 2, 3, 4, &mut rng);

        let census = physics.census();
        assert_eq!(census.total, 2 * 8 + 3 + 4);
        assert_eq!(census.count(species::CATALYST, state::FREE), 3);
        for component in species::COMPONENTS {
            assert_eq!(census.count(component, state::BONDED), 2);
        }
        // Corner particles carry two bonds, inner strand particles three.
        for particle in physics.particles() {
            if particle.species == species::A && particle.state == state::BONDED {
                assert_eq!(particle.bond_count(), 2);
            }
            if particle.species == species::B && particle.state == state::BONDED {
                assert_eq!(particle.bond_count(), 3);
            }
        }
    }

    #[test]
    fn test_grids_too_small_for_placement_seed_nothing() {
        // Valid configs can be narrower than an octet or shallower than the
        // placement band; seeding must decline rather than draw from an
        // empty range.
        for grid in [
            GridConfig {
                width: 1,
                ..Default::default()
            },
            GridConfig {
                height: 3,
                ..Default::default()
            },
        ] {
            let config = SimConfig {
                grid,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
            let mut physics = Physics::new(config);
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            seed_population(&mut physics, 1, 1, 1, &mut rng);
            assert_eq!(physics.particle_count(), 0);
        }
    }

    #[test]
    fn test_molecule_report_reads_a_states() {
        let mut physics = Physics::new(SimConfig::default());
        for (sp, st) in [
            (species::A, state::BONDED),
            (species::A, state::UNBONDED),
            (species::A, state::UNBONDED),
            (species::W, state::BONDED),
        ] {
            let id = physics.create_particle(sp).unwrap();
            physics.particle_mut(id).unwrap().state = st;
        }
        let report = molecule_report(&physics.census());
        assert_eq!(report.replicators, 1);
        assert_eq!(report.strands, 2);
    }

    #[test]
    fn test_species_labels() {
        assert_eq!(species::label(species::A), 'A');
        assert_eq!(species::label(species::CATALYST), '*');
        assert_eq!(species::label(99), '?');
    }
}
