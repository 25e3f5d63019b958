//! Configuration management for simulation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! the `config.toml` file. All simulation parameters can be customized through
//! this configuration system.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impl)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command-line flags (override both)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! seed = 42
//!
//! [grid]
//! width = 20
//! height = 20
//!
//! [physics]
//! viscosity = 0.1
//! max_bond_length = 5.0
//! ```

use serde::{Deserialize, Serialize};

/// Grid-level simulation configuration.
///
/// Defines the dimensions of the toroidal-free, hard-walled cell grid and the
/// stepping parameters shared by every pass of the physics update.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    pub time_step: f32,
    pub max_particles: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            time_step: 1.0,
            max_particles: 5000,
        }
    }
}

impl GridConfig {
    /// Center of the lowest addressable cell on either axis.
    #[must_use]
    pub fn min_center(&self) -> f32 {
        0.5
    }

    /// Center of the highest addressable cell on the x axis.
    #[must_use]
    pub fn max_center_x(&self) -> f32 {
        (self.width - 1) as f32 + 0.5
    }

    /// Center of the highest addressable cell on the y axis.
    #[must_use]
    pub fn max_center_y(&self) -> f32 {
        (self.height - 1) as f32 + 0.5
    }
}

/// Force and motion configuration.
///
/// Controls damping, thermal agitation, electrostatics and the stretch limit
/// past which bonds tear.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PhysicsConfig {
    pub viscosity: f32,
    pub max_velocity: f32,
    pub brownian_probability: f32,
    pub max_brownian_force: f32,
    pub charge_constant: f32,
    pub max_bond_length: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            viscosity: 0.1,
            max_velocity: 0.5,
            brownian_probability: 0.02,
            max_brownian_force: 0.05,
            charge_constant: 1.0,
            max_bond_length: 5.0,
        }
    }
}

/// Template applied to every particle minted at runtime.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParticleConfig {
    pub radius: f32,
    pub mass: f32,
    pub charge: f32,
    pub restitution: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            mass: 1.0,
            charge: 0.0,
            restitution: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimConfig {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub particle: ParticleConfig,
    pub seed: Option<u64>,
}

impl SimConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    ///
    /// # Validation Rules
    /// - Grid dimensions must be positive and reasonable (< 1000)
    /// - The time step and stretch limit must be positive
    /// - Probabilities and the viscosity must be in [0.0, 1.0]
    /// - Particle geometry and mass must be positive
    pub fn validate(&self) -> anyhow::Result<()> {
        // Grid validation
        anyhow::ensure!(self.grid.width > 0, "Grid width must be positive");
        anyhow::ensure!(self.grid.width <= 1000, "Grid width too large (max 1000)");
        anyhow::ensure!(self.grid.height > 0, "Grid height must be positive");
        anyhow::ensure!(
            self.grid.height <= 1000,
            "Grid height too large (max 1000)"
        );
        anyhow::ensure!(self.grid.time_step > 0.0, "Time step must be positive");
        anyhow::ensure!(
            self.grid.max_particles > 0,
            "Particle capacity must be positive"
        );

        // Physics validation
        anyhow::ensure!(
            self.physics.viscosity >= 0.0 && self.physics.viscosity <= 1.0,
            "Viscosity must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.physics.max_velocity > 0.0,
            "Velocity ceiling must be positive"
        );
        anyhow::ensure!(
            self.physics.brownian_probability >= 0.0 && self.physics.brownian_probability <= 1.0,
            "Brownian probability must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.physics.max_brownian_force >= 0.0,
            "Brownian force cap must be non-negative"
        );
        anyhow::ensure!(
            self.physics.max_bond_length > 0.0,
            "Bond stretch limit must be positive"
        );

        // Particle template validation
        anyhow::ensure!(self.particle.radius > 0.0, "Particle radius must be positive");
        anyhow::ensure!(self.particle.mass > 0.0, "Particle mass must be positive");
        anyhow::ensure!(
            self.particle.restitution >= 0.0,
            "Restitution must be non-negative"
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// Absent sections and keys fall back to their defaults.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }
}
