use serde::{Deserialize, Serialize};

/// One of the eight compass directions, indexed clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Direction {
    #[default]
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    pub const COUNT: usize = 8;

    /// All directions in clockwise index order.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::Northeast,
        Direction::East,
        Direction::Southeast,
        Direction::South,
        Direction::Southwest,
        Direction::West,
        Direction::Northwest,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index, wrapping modulo 8.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::COUNT]
    }

    /// Strict conversion from a persisted direction code.
    #[must_use]
    pub fn try_from_code(code: i64) -> Option<Self> {
        if (0..8).contains(&code) {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Direction reached by stepping `amount` places clockwise (negative
    /// steps counterclockwise), wrapping around the compass.
    #[must_use]
    pub fn rotated(self, amount: i32) -> Self {
        let index = (self.index() as i32 + amount).rem_euclid(8);
        Self::ALL[index as usize]
    }

    /// Unit grid offset of the neighborhood ring cell in this direction.
    /// Diagonals offset a full cell on both axes.
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::Northeast => (1, 1),
            Direction::East => (1, 0),
            Direction::Southeast => (1, -1),
            Direction::South => (0, -1),
            Direction::Southwest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::Northwest => (-1, 1),
        }
    }

    /// Left-right reflection. Cardinal north/south are invariant, the other
    /// six swap across the vertical axis.
    #[must_use]
    pub fn reflected(self) -> Self {
        match self {
            Direction::North => Direction::North,
            Direction::Northeast => Direction::Northwest,
            Direction::East => Direction::West,
            Direction::Southeast => Direction::Southwest,
            Direction::South => Direction::South,
            Direction::Southwest => Direction::Southeast,
            Direction::West => Direction::East,
            Direction::Northwest => Direction::Northeast,
        }
    }
}

/// Rotation angle of each facing, degrees. Mirroring negates the angle.
const DIRECTION_ANGLES: [f64; 8] = [0.0, -45.0, -90.0, -135.0, -180.0, 135.0, 90.0, 45.0];

/// Bias nudging rotated coordinates off exact integer boundaries before
/// truncation, so half-integer results do not flicker between cells.
const TRANSFORM_EPSILON: f64 = 0.5e-5;

/// A discrete facing: one of eight compass directions plus an independent
/// left-right mirror flag. Mirroring reverses the handedness of rotation
/// composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Orientation {
    pub direction: Direction,
    pub mirrored: bool,
}

impl Orientation {
    #[must_use]
    pub fn new(direction: Direction, mirrored: bool) -> Self {
        Self {
            direction,
            mirrored,
        }
    }

    /// Unmirrored orientation facing `direction`.
    #[must_use]
    pub fn facing(direction: Direction) -> Self {
        Self::new(direction, false)
    }

    /// Composes `amount` rotation steps into the current facing.
    pub fn rotate(&mut self, amount: i32) {
        self.direction = self.aim(amount);
    }

    /// Absolute direction reached by rotating `amount` steps from the
    /// current facing, without mutating it. Mirrored orientations rotate
    /// the opposite way.
    #[must_use]
    pub fn aim(&self, amount: i32) -> Direction {
        if self.mirrored {
            self.direction.rotated(-amount)
        } else {
            self.direction.rotated(amount)
        }
    }

    /// Combined mirror sense of this orientation and another mirror flag,
    /// used when a created particle inherits mirroring from its creator and
    /// a rule-specified flag.
    #[must_use]
    pub fn mirror_of_mirror(&self, mirrored: bool) -> bool {
        self.mirrored != mirrored
    }

    /// Rotates (and reflects, when mirrored) an integer offset by this
    /// orientation's angle, truncating back to integers.
    #[must_use]
    pub fn transform(&self, x: i32, y: i32) -> (i32, i32) {
        let mut angle = DIRECTION_ANGLES[self.direction.index()];
        if self.mirrored {
            angle = -angle;
        }
        let angle = angle.to_radians();
        let x2 = f64::from(x) * angle.cos() - f64::from(y) * angle.sin();
        let y2 = f64::from(y) * angle.cos() + f64::from(x) * angle.sin();
        let x2 = if x2 < 0.0 {
            x2 - TRANSFORM_EPSILON
        } else {
            x2 + TRANSFORM_EPSILON
        };
        let y2 = if y2 < 0.0 {
            y2 - TRANSFORM_EPSILON
        } else {
            y2 + TRANSFORM_EPSILON
        };
        (x2 as i32, y2 as i32)
    }
}
