use serde::{Deserialize, Serialize};

use super::bond::Bond;
use super::orientation::{Direction, Orientation};

/// Species constraint on one pattern cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeciesRule {
    /// Cell is not examined at all.
    #[default]
    Ignore,
    /// Cell must hold no particles.
    Empty,
    /// Cell must hold at least one particle, species irrelevant.
    Occupied,
    /// Cell must hold at least one particle of this species.
    Is(i32),
}

impl SpeciesRule {
    /// Persisted integer code. Non-negative codes are species, negative
    /// codes are the sentinels.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            SpeciesRule::Ignore => -1,
            SpeciesRule::Empty => -2,
            SpeciesRule::Occupied => -3,
            SpeciesRule::Is(species) => i64::from(species),
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(SpeciesRule::Ignore),
            -2 => Some(SpeciesRule::Empty),
            -3 => Some(SpeciesRule::Occupied),
            species if (0..=i64::from(i32::MAX)).contains(&species) => {
                Some(SpeciesRule::Is(species as i32))
            }
            _ => None,
        }
    }
}

/// State constraint on one pattern cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StateRule {
    #[default]
    Any,
    Is(i32),
}

impl StateRule {
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            StateRule::Any => -1,
            StateRule::Is(state) => i64::from(state),
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(StateRule::Any),
            state if (0..=i64::from(i32::MAX)).contains(&state) => {
                Some(StateRule::Is(state as i32))
            }
            _ => None,
        }
    }

    /// Whether a particle state satisfies this constraint.
    #[must_use]
    pub fn accepts(self, state: i32) -> bool {
        match self {
            StateRule::Any => true,
            StateRule::Is(expected) => expected == state,
        }
    }
}

/// Effect a matched reaction applies at its target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionKind {
    Create,
    Bond,
    SetSpecies,
    SetState,
    Orient,
    Unbond,
    Destroy,
}

impl ReactionKind {
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            ReactionKind::Create => 0,
            ReactionKind::Bond => 1,
            ReactionKind::SetSpecies => 2,
            ReactionKind::SetState => 3,
            ReactionKind::Orient => 4,
            ReactionKind::Unbond => 5,
            ReactionKind::Destroy => 6,
        }
    }

    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ReactionKind::Create),
            1 => Some(ReactionKind::Bond),
            2 => Some(ReactionKind::SetSpecies),
            3 => Some(ReactionKind::SetState),
            4 => Some(ReactionKind::Orient),
            5 => Some(ReactionKind::Unbond),
            6 => Some(ReactionKind::Destroy),
            _ => None,
        }
    }
}

/// A declarative rule matched against the oriented 3×3 neighborhood of a
/// focal particle.
///
/// Pattern grids are indexed `[x][y]` with x west-to-east and y
/// south-to-north; the focal particle sits at `(1, 1)`. The target cell
/// names where the effect lands, in the same grid coordinates. Rules are
/// built once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub description: String,
    pub species: [[SpeciesRule; 3]; 3],
    pub states: [[StateRule; 3]; 3],
    pub kind: ReactionKind,
    pub target_x: usize,
    pub target_y: usize,
    /// Next state for the focal particle, applied on match.
    pub source_state: Option<i32>,
    /// Next state for each affected target particle.
    pub target_state: Option<i32>,
    /// Species parameter for create and set-species effects.
    pub new_species: i32,
    /// Orientation delta composed into the focal orientation for create and
    /// orient effects.
    pub orientation: Orientation,
    /// Slot direction delta on the focal side of a new bond; also the slot
    /// removed by an unbond effect.
    pub source_bond: Direction,
    /// Slot direction delta on the partner side of a new bond.
    pub target_bond: Direction,
    pub bond_strength: f32,
}

impl Reaction {
    /// A rule with an unconstrained pattern targeting the center cell.
    #[must_use]
    pub fn new(description: impl Into<String>, kind: ReactionKind) -> Self {
        Self {
            description: description.into(),
            species: [[SpeciesRule::Ignore; 3]; 3],
            states: [[StateRule::Any; 3]; 3],
            kind,
            target_x: 1,
            target_y: 1,
            source_state: None,
            target_state: None,
            new_species: 0,
            orientation: Orientation::default(),
            source_bond: Direction::North,
            target_bond: Direction::North,
            bond_strength: Bond::DEFAULT_STRENGTH,
        }
    }

    pub fn set_species(&mut self, x: usize, y: usize, rule: SpeciesRule) {
        self.species[x][y] = rule;
    }

    pub fn set_state(&mut self, x: usize, y: usize, state: i32) {
        self.states[x][y] = StateRule::Is(state);
    }

    pub fn set_target(&mut self, x: usize, y: usize) {
        debug_assert!(x < 3 && y < 3);
        self.target_x = x;
        self.target_y = y;
    }

    /// Species constraint at the target cell; the effect loop only touches
    /// particles of this species.
    #[must_use]
    pub fn target_species(&self) -> SpeciesRule {
        self.species[self.target_x][self.target_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_rule_codes_round_trip() {
        for rule in [
            SpeciesRule::Ignore,
            SpeciesRule::Empty,
            SpeciesRule::Occupied,
            SpeciesRule::Is(0),
            SpeciesRule::Is(42),
        ] {
            assert_eq!(SpeciesRule::from_code(rule.code()), Some(rule));
        }
        assert_eq!(SpeciesRule::from_code(-4), None);
    }

    #[test]
    fn state_rule_codes_round_trip() {
        for rule in [StateRule::Any, StateRule::Is(0), StateRule::Is(3)] {
            assert_eq!(StateRule::from_code(rule.code()), Some(rule));
        }
        assert_eq!(StateRule::from_code(-2), None);
    }

    #[test]
    fn kind_codes_are_dense_and_stable() {
        for code in 0..7 {
            let kind = ReactionKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(ReactionKind::from_code(7), None);
        assert_eq!(ReactionKind::from_code(-1), None);
    }

    #[test]
    fn state_rule_acceptance() {
        assert!(StateRule::Any.accepts(9));
        assert!(StateRule::Is(2).accepts(2));
        assert!(!StateRule::Is(2).accepts(3));
    }

    #[test]
    fn new_rule_targets_center_with_open_pattern() {
        let mut reaction = Reaction::new("noop", ReactionKind::SetState);
        assert_eq!((reaction.target_x, reaction.target_y), (1, 1));
        assert_eq!(reaction.target_species(), SpeciesRule::Ignore);

        reaction.set_species(0, 1, SpeciesRule::Is(8));
        reaction.set_state(0, 1, 2);
        reaction.set_target(0, 1);
        assert_eq!(reaction.target_species(), SpeciesRule::Is(8));
        assert_eq!(reaction.states[0][1], StateRule::Is(2));
    }
}
