//! scintmap command-line interface.
//!
//! Converts simulation event tables into per-event cell energy maps.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use scintmap_core::{ExtractionConfig, ZeroTotalPolicy, DEFAULT_CELL_COUNT, DEFAULT_PARTICLE_NAME};
use scintmap_io::{
    describe_tables_hdf5, process_fractional_energy, CsvWriteOptions, ProcessOptions,
    DEFAULT_OUTPUT_PATH,
};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    ScintmapIo(#[from] scintmap_io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scintillator energy map extractor.
#[derive(Parser)]
#[command(name = "scintmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an event file into fractional cell energies with true positions
    Process {
        /// Input HDF5 file with SpectrumData and MuonTrackData tables
        input: PathBuf,

        /// Output file (.csv, or .h5/.hdf5 for HDF5)
        #[arg(default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Number of detector cells mapped to columns
        #[arg(long, default_value_t = DEFAULT_CELL_COUNT)]
        cells: u32,

        /// Particle whose energy is mapped
        #[arg(long, default_value = DEFAULT_PARTICLE_NAME)]
        particle: String,

        /// Write 0.0 instead of NaN for events with zero total energy
        #[arg(long)]
        zero_fill_nan: bool,

        /// Digits after the decimal point in CSV output
        #[arg(long, default_value_t = 6)]
        precision: usize,

        /// Rows of the result to print (0 disables the preview)
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },

    /// List the tables of an event file
    Info {
        /// Input HDF5 file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Process {
            input,
            output,
            cells,
            particle,
            zero_fill_nan,
            precision,
            preview,
        } => {
            let zero_total = if zero_fill_nan {
                ZeroTotalPolicy::ZeroFill
            } else {
                ZeroTotalPolicy::Propagate
            };
            let options = ProcessOptions {
                extraction: ExtractionConfig::default()
                    .with_cell_count(cells)
                    .with_particle_name(particle)
                    .with_zero_total(zero_total),
                csv: CsvWriteOptions::default().with_float_precision(precision),
                ..ProcessOptions::default()
            };
            debug!("processing {} with {:?}", input.display(), options);

            let start = Instant::now();
            let report = process_fractional_energy(&input, &output, &options)?;

            println!("Data saved to {}", report.output_path.display());

            if cli.verbose {
                let stats = &report.statistics;
                eprintln!("Processed in {:.2}s", start.elapsed().as_secs_f64());
                eprintln!("  {} spectrum records", stats.spectrum_records);
                eprintln!("  {} matching {}", stats.matched_records, options.extraction.particle_name);
                eprintln!("  {} (event, cell) groups beyond cell limit", stats.dropped_cell_groups);
                eprintln!("  {} muon steps", stats.muon_steps);
                eprintln!("  {} events", stats.events);
                eprintln!("  {} events without muon track", stats.events_without_track);
                eprintln!("  {} events with zero total energy", stats.zero_total_events);
            }

            if preview > 0 {
                println!();
                println!("Energy map in memory (EventID is the row index):");
                println!("{}", report.table.preview(preview));
            }
        }

        Commands::Info { input, json } => {
            let tables = describe_tables_hdf5(&input)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tables)?);
            } else {
                println!("File: {}", input.display());
                for table in &tables {
                    println!("{}: {} rows", table.name, table.rows);
                    println!("  columns: {}", table.columns.join(", "));
                }
            }
        }
    }

    Ok(())
}
