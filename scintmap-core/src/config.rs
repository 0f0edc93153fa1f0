//! Extraction configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of cells in the first scintillator layer.
pub const DEFAULT_CELL_COUNT: u32 = 64;

/// Particle whose energy is mapped onto cells.
pub const DEFAULT_PARTICLE_NAME: &str = "opticalphoton";

/// What to do with events whose summed photon energy is zero.
///
/// Dividing by a zero total produces NaN fractions. `Propagate` keeps them,
/// so they reach the output file; `ZeroFill` replaces them with 0.0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZeroTotalPolicy {
    #[default]
    Propagate,
    ZeroFill,
}

/// Configuration for fractional-energy extraction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractionConfig {
    /// Only spectrum records with this particle name are aggregated.
    pub particle_name: String,
    /// Cells `0..cell_count` become output columns; records with
    /// `CellID >= cell_count` are dropped before normalisation.
    pub cell_count: u32,
    /// Handling of events with zero total energy.
    pub zero_total: ZeroTotalPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            particle_name: DEFAULT_PARTICLE_NAME.to_string(),
            cell_count: DEFAULT_CELL_COUNT,
            zero_total: ZeroTotalPolicy::Propagate,
        }
    }
}

impl ExtractionConfig {
    /// Set the particle name filter.
    #[must_use]
    pub fn with_particle_name(mut self, name: impl Into<String>) -> Self {
        self.particle_name = name.into();
        self
    }

    /// Set the number of canonical cells.
    #[must_use]
    pub fn with_cell_count(mut self, cell_count: u32) -> Self {
        self.cell_count = cell_count;
        self
    }

    /// Set the zero-total policy.
    #[must_use]
    pub fn with_zero_total(mut self, policy: ZeroTotalPolicy) -> Self {
        self.zero_total = policy;
        self
    }

    /// Checks the configuration for values the extractor cannot work with.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero cell count, a cell count
    /// beyond `i32::MAX` or an empty particle name.
    pub fn validate(&self) -> Result<()> {
        if self.cell_count == 0 {
            return Err(Error::ConfigError("cell_count must be at least 1".into()));
        }
        if i32::try_from(self.cell_count).is_err() {
            return Err(Error::ConfigError(format!(
                "cell_count {} exceeds the CellID range",
                self.cell_count
            )));
        }
        if self.particle_name.is_empty() {
            return Err(Error::ConfigError("particle_name must not be empty".into()));
        }
        Ok(())
    }

    /// Exclusive upper bound applied to `CellID`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn cell_limit(&self) -> i32 {
        // validate() keeps cell_count within i32.
        self.cell_count as i32
    }

    /// Number of canonical cell columns.
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cell_count as usize
    }
}
