//! scintmap-io: Event-table input and energy-map output for scintmap.
//!
//! Reads simulation tables from HDF5, writes energy maps as CSV or HDF5,
//! and ties both ends together in [`process_fractional_energy`].
//!

mod error;
pub mod hdf5;
pub mod pipeline;
mod writer;

pub use crate::hdf5::{
    describe_tables_hdf5, read_energy_map_hdf5, read_event_tables_hdf5, write_energy_map_hdf5,
    write_event_tables_hdf5, Hdf5WriteOptions, TableSummary,
};
pub use error::{Error, Result};
pub use pipeline::{
    process, process_fractional_energy, OutputFormat, ProcessOptions, ProcessReport,
    DEFAULT_OUTPUT_PATH,
};
pub use writer::{write_energy_map_csv, CsvWriteOptions, EnergyMapCsvWriter};
