//! scintmap-core: Core tables and aggregation for scintillator energy maps.
//!
//! This crate turns per-particle spectrum records and muon track steps
//! from a detector simulation into one row per event of fractional cell
//! energies labelled with the true muon position.
//!

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extractor;
pub mod record;
pub mod table;

pub use config::{ExtractionConfig, ZeroTotalPolicy, DEFAULT_CELL_COUNT, DEFAULT_PARTICLE_NAME};
pub use error::{Error, Result};
pub use extractor::{ExtractionStatistics, FractionalEnergyExtractor};
pub use record::{EventTables, MuonStepExtra, MuonTrackTable, SpectrumTable};
pub use table::{cell_column_name, EnergyMapRow, EnergyMapTable, X_TRUE, Y_TRUE};
