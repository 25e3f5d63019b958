//! Save/load of a full automaton in the flat text format.
//!
//! Layout, in token order:
//!
//! 1. particle count, then one record per particle: id, species, state,
//!    radius, mass, charge, restitution, orientation direction, mirror flag,
//!    position, velocity, force;
//! 2. one bond-association record per particle: the holder id, then its
//!    eight slots in compass order, each `-1` when empty or the partner id
//!    followed by the slot's strength;
//! 3. reaction count, then one record per reaction: description token count
//!    and tokens, nine species codes, nine state codes, kind, target cell,
//!    next states, species parameter, orientation delta, bond directions,
//!    bond strength.
//!
//! Both sides of a bond carry the strength in the file; the load
//! consolidates them into one shared record, first side wins. The particle
//! id counter resumes past the highest id read. Input must end with the
//! last reaction record; trailing tokens are rejected.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ultraviolet::Vec2;

use protobiont_core::{Automaton, Physics, SimConfig};
use protobiont_data::{
    Bond, BondKey, Direction, Orientation, Particle, ParticleId, Reaction, ReactionKind,
    SpeciesRule, StateRule,
};

use crate::error::{IoError, Result};
use crate::text::{RecordWriter, TokenScanner};

/// Sentinel for an absent next-state field.
const NO_STATE: i64 = -1;

/// Writes the full particle/bond population and the reaction table.
pub fn save_automaton<W: Write>(automaton: &Automaton, writer: W) -> Result<()> {
    let mut out = RecordWriter::new(writer);
    let physics = automaton.physics();

    out.field(physics.particle_count())?;
    out.end_record()?;
    for particle in physics.particles() {
        write_particle(&mut out, particle)?;
    }
    for particle in physics.particles() {
        write_associations(&mut out, physics, particle)?;
    }

    let reactions = automaton.chemistry().reactions();
    out.field(reactions.len())?;
    out.end_record()?;
    for reaction in reactions {
        write_reaction(&mut out, reaction)?;
    }
    out.finish()
}

/// Rebuilds an automaton from a saved run, under the given configuration.
pub fn load_automaton<R: Read>(config: SimConfig, reader: R) -> Result<Automaton> {
    let mut scanner = TokenScanner::new(reader)?;

    let particle_count = scanner.next_usize()?;
    let mut particles = Vec::with_capacity(particle_count);
    let mut seen = HashSet::new();
    for _ in 0..particle_count {
        let particle = read_particle(&mut scanner)?;
        if !seen.insert(particle.id) {
            return Err(IoError::validation(format!(
                "duplicate particle id {}",
                particle.id
            )));
        }
        particles.push(particle);
    }

    let strengths = read_associations(&mut scanner, &mut particles)?;

    let reaction_count = scanner.next_usize()?;
    let mut reactions = Vec::with_capacity(reaction_count);
    for _ in 0..reaction_count {
        reactions.push(read_reaction(&mut scanner)?);
    }

    if !scanner.exhausted() {
        return Err(IoError::parse("trailing tokens after the reaction records"));
    }

    let mut automaton = Automaton::new(config);
    automaton.physics_mut().restore(particles, strengths);
    automaton.chemistry_mut().set_reactions(reactions);
    Ok(automaton)
}

/// Saves to a file, going through a temp file so a crash mid-write never
/// clobbers the previous save.
pub fn save_path<P: AsRef<Path>>(automaton: &Automaton, path: P) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        save_automaton(automaton, BufWriter::new(file))?;
    }
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn load_path<P: AsRef<Path>>(config: SimConfig, path: P) -> Result<Automaton> {
    let file = File::open(path.as_ref())?;
    load_automaton(config, BufReader::new(file))
}

fn write_particle<W: Write>(out: &mut RecordWriter<W>, particle: &Particle) -> Result<()> {
    out.field(particle.id)?;
    out.field(particle.species)?;
    out.field(particle.state)?;
    out.field(particle.radius)?;
    out.field(particle.mass)?;
    out.field(particle.charge)?;
    out.field(particle.restitution)?;
    out.field(particle.orientation.direction.index())?;
    out.flag(particle.orientation.mirrored)?;
    out.field(particle.position.x)?;
    out.field(particle.position.y)?;
    out.field(particle.velocity.x)?;
    out.field(particle.velocity.y)?;
    out.field(particle.force.x)?;
    out.field(particle.force.y)?;
    out.end_record()
}

fn read_particle(scanner: &mut TokenScanner) -> Result<Particle> {
    let id = ParticleId(scanner.next_u64()?);
    let species = scanner.next_i32()?;
    let state = scanner.next_i32()?;
    let radius = scanner.next_f32()?;
    let mass = scanner.next_f32()?;
    let charge = scanner.next_f32()?;
    let restitution = scanner.next_f32()?;
    let direction = read_direction(scanner)?;
    let mirrored = scanner.next_flag()?;

    let mut particle = Particle::new(id, species, radius, mass, charge, restitution);
    particle.state = state;
    particle.orientation = Orientation::new(direction, mirrored);
    particle.position = Vec2::new(scanner.next_f32()?, scanner.next_f32()?);
    particle.velocity = Vec2::new(scanner.next_f32()?, scanner.next_f32()?);
    particle.force = Vec2::new(scanner.next_f32()?, scanner.next_f32()?);
    Ok(particle)
}

fn write_associations<W: Write>(
    out: &mut RecordWriter<W>,
    physics: &Physics,
    particle: &Particle,
) -> Result<()> {
    out.field(particle.id)?;
    for direction in Direction::ALL {
        match particle.bond(direction) {
            None => out.field(-1)?,
            Some(partner) => {
                out.field(partner)?;
                let strength = physics
                    .bond_strength(particle.id, partner)
                    .unwrap_or(Bond::DEFAULT_STRENGTH);
                out.field(strength)?;
            }
        }
    }
    out.end_record()
}

/// Fills every particle's slot array and collects the strength records.
fn read_associations(
    scanner: &mut TokenScanner,
    particles: &mut [Particle],
) -> Result<Vec<(BondKey, f32)>> {
    let index: HashMap<ParticleId, usize> = particles
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id, i))
        .collect();
    let mut strengths = Vec::new();
    for _ in 0..particles.len() {
        let holder = ParticleId(scanner.next_u64()?);
        let &holder_index = index
            .get(&holder)
            .ok_or_else(|| IoError::validation(format!("bond record for unknown particle {holder}")))?;
        for direction in Direction::ALL {
            let partner = scanner.next_i64()?;
            if partner == -1 {
                continue;
            }
            let partner = ParticleId(u64::try_from(partner).map_err(|_| {
                IoError::parse(format!("invalid bond partner id {partner}"))
            })?);
            let strength = scanner.next_f32()?;
            if !index.contains_key(&partner) {
                return Err(IoError::validation(format!(
                    "particle {holder} bonded to unknown particle {partner}"
                )));
            }
            particles[holder_index].bonds[direction.index()] = Some(partner);
            strengths.push((BondKey::new(holder, partner), strength));
        }
    }
    Ok(strengths)
}

fn write_reaction<W: Write>(out: &mut RecordWriter<W>, reaction: &Reaction) -> Result<()> {
    let words: Vec<&str> = reaction.description.split_whitespace().collect();
    out.field(words.len())?;
    for word in words {
        out.field(word)?;
    }
    out.end_record()?;
    for x in 0..3 {
        for y in 0..3 {
            out.field(reaction.species[x][y].code())?;
        }
    }
    for x in 0..3 {
        for y in 0..3 {
            out.field(reaction.states[x][y].code())?;
        }
    }
    out.field(reaction.kind.code())?;
    out.field(reaction.target_x)?;
    out.field(reaction.target_y)?;
    out.field(reaction.source_state.map_or(NO_STATE, i64::from))?;
    out.field(reaction.target_state.map_or(NO_STATE, i64::from))?;
    out.field(reaction.new_species)?;
    out.field(reaction.orientation.direction.index())?;
    out.flag(reaction.orientation.mirrored)?;
    out.field(reaction.source_bond.index())?;
    out.field(reaction.target_bond.index())?;
    out.field(reaction.bond_strength)?;
    out.end_record()
}

fn read_reaction(scanner: &mut TokenScanner) -> Result<Reaction> {
    let word_count = scanner.next_usize()?;
    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        words.push(scanner.next_token()?.to_owned());
    }

    let mut species = [[SpeciesRule::Ignore; 3]; 3];
    for column in &mut species {
        for cell in column {
            let code = scanner.next_i64()?;
            *cell = SpeciesRule::from_code(code)
                .ok_or_else(|| IoError::parse(format!("invalid species code {code}")))?;
        }
    }
    let mut states = [[StateRule::Any; 3]; 3];
    for column in &mut states {
        for cell in column {
            let code = scanner.next_i64()?;
            *cell = StateRule::from_code(code)
                .ok_or_else(|| IoError::parse(format!("invalid state code {code}")))?;
        }
    }

    let kind_code = scanner.next_i64()?;
    let kind = ReactionKind::from_code(kind_code)
        .ok_or_else(|| IoError::parse(format!("invalid reaction kind {kind_code}")))?;

    let mut reaction = Reaction::new(words.join(" "), kind);
    reaction.species = species;
    reaction.states = states;

    let target_x = scanner.next_usize()?;
    let target_y = scanner.next_usize()?;
    if target_x > 2 || target_y > 2 {
        return Err(IoError::validation(format!(
            "reaction target ({target_x}, {target_y}) outside the 3x3 pattern"
        )));
    }
    reaction.target_x = target_x;
    reaction.target_y = target_y;
    reaction.source_state = read_state_field(scanner)?;
    reaction.target_state = read_state_field(scanner)?;
    reaction.new_species = scanner.next_i32()?;
    let direction = read_direction(scanner)?;
    let mirrored = scanner.next_flag()?;
    reaction.orientation = Orientation::new(direction, mirrored);
    reaction.source_bond = read_direction(scanner)?;
    reaction.target_bond = read_direction(scanner)?;
    reaction.bond_strength = scanner.next_f32()?;
    Ok(reaction)
}

fn read_state_field(scanner: &mut TokenScanner) -> Result<Option<i32>> {
    match scanner.next_i64()? {
        NO_STATE => Ok(None),
        state => i32::try_from(state)
            .map(Some)
            .map_err(|_| IoError::parse(format!("state {state} out of range"))),
    }
}

fn read_direction(scanner: &mut TokenScanner) -> Result<Direction> {
    let code = scanner.next_i64()?;
    Direction::try_from_code(code)
        .ok_or_else(|| IoError::parse(format!("invalid direction code {code}")))
}
