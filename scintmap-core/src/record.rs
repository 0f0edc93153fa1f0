//! Columnar record tables read from simulation output.
//!
//! Both tables mirror the ntuples written by the simulation: one
//! parallel vector per column, one element per record.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Column names of the `SpectrumData` table.
pub mod spectrum_columns {
    pub const TABLE: &str = "SpectrumData";
    pub const EVENT_ID: &str = "EventID";
    pub const CELL_ID: &str = "CellID";
    pub const PARTICLE_NAME: &str = "ParticleName";
    pub const ENERGY_MEV: &str = "EnergyMeV";
}

/// Column names of the `MuonTrackData` table.
pub mod muon_track_columns {
    pub const TABLE: &str = "MuonTrackData";
    pub const EVENT_ID: &str = "EventID";
    pub const PRE_STEP_X_CM: &str = "PreStepX_cm";
    pub const PRE_STEP_Y_CM: &str = "PreStepY_cm";
    pub const PRE_STEP_Z_CM: &str = "PreStepZ_cm";
    pub const POST_STEP_X_CM: &str = "PostStepX_cm";
    pub const POST_STEP_Y_CM: &str = "PostStepY_cm";
    pub const POST_STEP_Z_CM: &str = "PostStepZ_cm";
}

/// Particles reaching a cell boundary, one row per crossing.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpectrumTable {
    pub event_id: Vec<i32>,
    pub cell_id: Vec<i32>,
    pub particle_name: Vec<String>,
    /// Energy in MeV (total energy for optical photons).
    pub energy_mev: Vec<f64>,
}

impl SpectrumTable {
    /// Creates an empty table with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            event_id: Vec::with_capacity(capacity),
            cell_id: Vec::with_capacity(capacity),
            particle_name: Vec::with_capacity(capacity),
            energy_mev: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.event_id.len()
    }

    /// Returns true if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_id.is_empty()
    }

    /// Appends a single record.
    pub fn push(&mut self, event_id: i32, cell_id: i32, particle_name: &str, energy_mev: f64) {
        self.event_id.push(event_id);
        self.cell_id.push(cell_id);
        self.particle_name.push(particle_name.to_string());
        self.energy_mev.push(energy_mev);
    }

    /// Checks that all columns have the same length.
    ///
    /// # Errors
    /// Returns [`Error::ColumnLengthMismatch`] naming the first ragged column.
    pub fn validate(&self) -> Result<()> {
        use spectrum_columns as c;
        let expected = self.event_id.len();
        check_len(c::TABLE, c::CELL_ID, expected, self.cell_id.len())?;
        check_len(c::TABLE, c::PARTICLE_NAME, expected, self.particle_name.len())?;
        check_len(c::TABLE, c::ENERGY_MEV, expected, self.energy_mev.len())
    }
}

/// Primary muon trajectory, one row per simulation step.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuonTrackTable {
    pub event_id: Vec<i32>,
    pub pre_step_x_cm: Vec<f64>,
    pub pre_step_y_cm: Vec<f64>,
    /// Remaining step coordinates, carried when the source provides them.
    pub extra: Option<MuonStepExtra>,
}

/// Step coordinates not used by the energy-map extraction.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MuonStepExtra {
    pub pre_step_z_cm: Vec<f64>,
    pub post_step_x_cm: Vec<f64>,
    pub post_step_y_cm: Vec<f64>,
    pub post_step_z_cm: Vec<f64>,
}

impl MuonTrackTable {
    /// Creates an empty table with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            event_id: Vec::with_capacity(capacity),
            pre_step_x_cm: Vec::with_capacity(capacity),
            pre_step_y_cm: Vec::with_capacity(capacity),
            extra: None,
        }
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.event_id.len()
    }

    /// Returns true if the table has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_id.is_empty()
    }

    /// Appends a single step.
    pub fn push(&mut self, event_id: i32, pre_step_x_cm: f64, pre_step_y_cm: f64) {
        self.event_id.push(event_id);
        self.pre_step_x_cm.push(pre_step_x_cm);
        self.pre_step_y_cm.push(pre_step_y_cm);
    }

    /// Checks that all columns have the same length.
    ///
    /// # Errors
    /// Returns [`Error::ColumnLengthMismatch`] naming the first ragged column.
    pub fn validate(&self) -> Result<()> {
        use muon_track_columns as c;
        let expected = self.event_id.len();
        check_len(c::TABLE, c::PRE_STEP_X_CM, expected, self.pre_step_x_cm.len())?;
        check_len(c::TABLE, c::PRE_STEP_Y_CM, expected, self.pre_step_y_cm.len())?;
        if let Some(extra) = &self.extra {
            check_len(c::TABLE, c::PRE_STEP_Z_CM, expected, extra.pre_step_z_cm.len())?;
            check_len(c::TABLE, c::POST_STEP_X_CM, expected, extra.post_step_x_cm.len())?;
            check_len(c::TABLE, c::POST_STEP_Y_CM, expected, extra.post_step_y_cm.len())?;
            check_len(c::TABLE, c::POST_STEP_Z_CM, expected, extra.post_step_z_cm.len())?;
        }
        Ok(())
    }
}

/// Both tables needed to build energy maps.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventTables {
    pub spectrum: SpectrumTable,
    pub muon_track: MuonTrackTable,
}

impl EventTables {
    #[must_use]
    pub fn new(spectrum: SpectrumTable, muon_track: MuonTrackTable) -> Self {
        Self {
            spectrum,
            muon_track,
        }
    }

    /// Validates both tables.
    ///
    /// # Errors
    /// Returns an error if either table has ragged columns.
    pub fn validate(&self) -> Result<()> {
        self.spectrum.validate()?;
        self.muon_track.validate()
    }
}

fn check_len(
    table: &'static str,
    column: &'static str,
    expected: usize,
    found: usize,
) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ColumnLengthMismatch {
            table,
            column,
            expected,
            found,
        })
    }
}
