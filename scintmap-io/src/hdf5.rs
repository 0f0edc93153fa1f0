//! HDF5 event tables and energy-map output.
//!
//! Input layout: one root group per table (`SpectrumData`,
//! `MuonTrackData`, optionally `EdepData`), each holding one 1-D dataset
//! per column, named after the column.

use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenAscii, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use log::{debug, info};
use ndarray::ArrayView1;
use scintmap_core::record::{muon_track_columns, spectrum_columns};
use scintmap_core::{EnergyMapTable, EventTables, MuonStepExtra, MuonTrackTable, SpectrumTable};
use std::path::Path;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ENERGY_MAP_GROUP: &str = "energy_maps";
const ROW_CHUNK: usize = 65_536;

/// Dataset creation options for HDF5 output.
#[derive(Clone, Debug)]
pub struct Hdf5WriteOptions {
    pub compression: Option<u8>,
    pub shuffle: bool,
}

impl Default for Hdf5WriteOptions {
    fn default() -> Self {
        Self {
            compression: Some(1),
            shuffle: true,
        }
    }
}

/// Name, columns and row count of one table in a file.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableSummary {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Reads the spectrum and muon track tables from an HDF5 file.
///
/// The file is closed before returning, on success and on error.
///
/// # Errors
/// Returns an error if the file cannot be opened, a table or column is
/// missing, or the columns of a table differ in length.
pub fn read_event_tables_hdf5<P: AsRef<Path>>(path: P) -> Result<EventTables> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let spectrum = read_spectrum_table(&open_table(&file, spectrum_columns::TABLE)?)?;
    let muon_track = read_muon_track_table(&open_table(&file, muon_track_columns::TABLE)?)?;

    let tables = EventTables::new(spectrum, muon_track);
    tables.validate()?;
    info!(
        "read {} spectrum records and {} muon steps from {}",
        tables.spectrum.len(),
        tables.muon_track.len(),
        path.display()
    );
    Ok(tables)
}

/// Writes event tables in the layout read by [`read_event_tables_hdf5`].
///
/// # Errors
/// Returns an error if the tables are ragged or HDF5 I/O fails.
pub fn write_event_tables_hdf5<P: AsRef<Path>>(
    path: P,
    tables: &EventTables,
    options: &Hdf5WriteOptions,
) -> Result<()> {
    tables.validate()?;
    let file = File::create(path)?;

    let spectrum = file.create_group(spectrum_columns::TABLE)?;
    let s = &tables.spectrum;
    write_column(&spectrum, spectrum_columns::EVENT_ID, &s.event_id, options)?;
    write_column(&spectrum, spectrum_columns::CELL_ID, &s.cell_id, options)?;
    let names = s
        .particle_name
        .iter()
        .map(|name| to_var_len_unicode(name))
        .collect::<Result<Vec<_>>>()?;
    write_column(&spectrum, spectrum_columns::PARTICLE_NAME, &names, options)?;
    let energy = write_column(&spectrum, spectrum_columns::ENERGY_MEV, &s.energy_mev, options)?;
    set_dataset_units(&energy, "MeV")?;

    let muon = file.create_group(muon_track_columns::TABLE)?;
    let m = &tables.muon_track;
    write_column(&muon, muon_track_columns::EVENT_ID, &m.event_id, options)?;
    write_column(&muon, muon_track_columns::PRE_STEP_X_CM, &m.pre_step_x_cm, options)?;
    write_column(&muon, muon_track_columns::PRE_STEP_Y_CM, &m.pre_step_y_cm, options)?;
    if let Some(extra) = &m.extra {
        write_column(&muon, muon_track_columns::PRE_STEP_Z_CM, &extra.pre_step_z_cm, options)?;
        write_column(&muon, muon_track_columns::POST_STEP_X_CM, &extra.post_step_x_cm, options)?;
        write_column(&muon, muon_track_columns::POST_STEP_Y_CM, &extra.post_step_y_cm, options)?;
        write_column(&muon, muon_track_columns::POST_STEP_Z_CM, &extra.post_step_z_cm, options)?;
    }

    debug!(
        "wrote {} spectrum records and {} muon steps",
        s.len(),
        m.len()
    );
    Ok(())
}

/// Lists the tables (root groups) of an HDF5 file.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn describe_tables_hdf5<P: AsRef<Path>>(path: P) -> Result<Vec<TableSummary>> {
    let file = File::open(path)?;
    let mut summaries = Vec::new();

    for name in file.member_names()? {
        let Ok(group) = file.group(&name) else {
            continue;
        };
        let columns = group.member_names()?;
        let rows = match columns.first() {
            Some(first) => group.dataset(first)?.shape().first().copied().unwrap_or(0),
            None => 0,
        };
        summaries.push(TableSummary {
            name,
            columns,
            rows,
        });
    }
    Ok(summaries)
}

/// Writes an energy map table to group `energy_maps`.
///
/// Datasets: `cell_fractions` (events x cells), `x_true`, `y_true` and
/// `event_id`. The group's `columns` attribute lists the column names.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_energy_map_hdf5<P: AsRef<Path>>(
    path: P,
    table: &EnergyMapTable,
    options: &Hdf5WriteOptions,
) -> Result<()> {
    let file = File::create(path)?;
    let group = file.create_group(ENERGY_MAP_GROUP)?;

    let columns = table
        .column_names()
        .iter()
        .map(|name| to_var_len_unicode(name))
        .collect::<Result<Vec<_>>>()?;
    group
        .new_attr::<VarLenUnicode>()
        .shape((columns.len(),))
        .create("columns")?
        .write(ArrayView1::from(columns.as_slice()))?;

    let (rows, cells) = table.cells().dim();
    let mut builder = group.new_dataset::<f64>().shape((rows, cells));
    if rows > 0 && cells > 0 {
        builder = builder.chunk((rows.min(ROW_CHUNK / cells.max(1)).max(1), cells));
        if let Some(level) = options.compression {
            builder = builder.deflate(level);
        }
        if options.shuffle {
            builder = builder.shuffle();
        }
    }
    let fractions = builder.create("cell_fractions")?;
    if rows > 0 {
        fractions.write(table.cells().view())?;
    }

    write_column(&group, "event_id", table.event_ids(), options)?;
    let x_true = write_column(&group, "x_true", table.x_true(), options)?;
    let y_true = write_column(&group, "y_true", table.y_true(), options)?;
    set_dataset_units(&x_true, "cm")?;
    set_dataset_units(&y_true, "cm")?;
    Ok(())
}

/// Reads an energy map table written by [`write_energy_map_hdf5`].
///
/// # Errors
/// Returns an error if HDF5 I/O fails or the datasets are inconsistent.
pub fn read_energy_map_hdf5<P: AsRef<Path>>(path: P) -> Result<EnergyMapTable> {
    let file = File::open(path)?;
    let group = open_table(&file, ENERGY_MAP_GROUP)?;

    let fractions = group.dataset("cell_fractions")?;
    if fractions.ndim() != 2 {
        return Err(Error::InvalidFormat(
            "cell_fractions must be 2-D (events, cells)".to_string(),
        ));
    }
    let cells = fractions.read_2d::<f64>()?;
    let event_ids = read_column::<i32>(&group, ENERGY_MAP_GROUP, "event_id")?;
    let x_true = read_column::<f64>(&group, ENERGY_MAP_GROUP, "x_true")?;
    let y_true = read_column::<f64>(&group, ENERGY_MAP_GROUP, "y_true")?;

    Ok(EnergyMapTable::new(event_ids, cells, x_true, y_true)?)
}

fn open_table(file: &File, name: &str) -> Result<Group> {
    if !file.link_exists(name) {
        return Err(Error::MissingTable(name.to_string()));
    }
    file.group(name)
        .map_err(|_| Error::MissingTable(name.to_string()))
}

fn read_spectrum_table(group: &Group) -> Result<SpectrumTable> {
    use spectrum_columns as c;
    Ok(SpectrumTable {
        event_id: read_column::<i32>(group, c::TABLE, c::EVENT_ID)?,
        cell_id: read_column::<i32>(group, c::TABLE, c::CELL_ID)?,
        particle_name: read_string_column(group, c::TABLE, c::PARTICLE_NAME)?,
        energy_mev: read_column::<f64>(group, c::TABLE, c::ENERGY_MEV)?,
    })
}

fn read_muon_track_table(group: &Group) -> Result<MuonTrackTable> {
    use muon_track_columns as c;

    let extra = match (
        read_column_opt::<f64>(group, c::PRE_STEP_Z_CM)?,
        read_column_opt::<f64>(group, c::POST_STEP_X_CM)?,
        read_column_opt::<f64>(group, c::POST_STEP_Y_CM)?,
        read_column_opt::<f64>(group, c::POST_STEP_Z_CM)?,
    ) {
        (Some(pre_step_z_cm), Some(post_step_x_cm), Some(post_step_y_cm), Some(post_step_z_cm)) => {
            Some(MuonStepExtra {
                pre_step_z_cm,
                post_step_x_cm,
                post_step_y_cm,
                post_step_z_cm,
            })
        }
        _ => None,
    };

    Ok(MuonTrackTable {
        event_id: read_column::<i32>(group, c::TABLE, c::EVENT_ID)?,
        pre_step_x_cm: read_column::<f64>(group, c::TABLE, c::PRE_STEP_X_CM)?,
        pre_step_y_cm: read_column::<f64>(group, c::TABLE, c::PRE_STEP_Y_CM)?,
        extra,
    })
}

fn column_dataset(group: &Group, table: &str, column: &str) -> Result<Dataset> {
    if !group.link_exists(column) {
        return Err(Error::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
    }
    Ok(group.dataset(column)?)
}

fn read_column<T: H5Type>(group: &Group, table: &str, column: &str) -> Result<Vec<T>> {
    Ok(column_dataset(group, table, column)?.read_raw::<T>()?)
}

fn read_column_opt<T: H5Type>(group: &Group, column: &str) -> Result<Option<Vec<T>>> {
    if group.link_exists(column) {
        Ok(Some(group.dataset(column)?.read_raw::<T>()?))
    } else {
        Ok(None)
    }
}

fn read_string_column(group: &Group, table: &str, column: &str) -> Result<Vec<String>> {
    let dataset = column_dataset(group, table, column)?;
    match dataset.read_raw::<VarLenUnicode>() {
        Ok(values) => Ok(values.iter().map(|v| v.as_str().to_string()).collect()),
        Err(_) => {
            let values = dataset.read_raw::<VarLenAscii>()?;
            Ok(values.iter().map(|v| v.as_str().to_string()).collect())
        }
    }
}

fn write_column<T: H5Type>(
    group: &Group,
    name: &str,
    data: &[T],
    options: &Hdf5WriteOptions,
) -> Result<Dataset> {
    let mut builder = group.new_dataset::<T>().shape((data.len(),));

    // Filters need a chunked layout, and chunks must be non-empty.
    if !data.is_empty() {
        builder = builder.chunk((data.len().min(ROW_CHUNK),));
        if let Some(level) = options.compression {
            builder = builder.deflate(level);
        }
        if options.shuffle {
            builder = builder.shuffle();
        }
    }

    let dataset = builder.create(name)?;
    if !data.is_empty() {
        dataset.write(ArrayView1::from(data))?;
    }
    Ok(dataset)
}

fn set_dataset_units(dataset: &Dataset, units: &str) -> Result<()> {
    let value = to_var_len_unicode(units)?;
    dataset
        .new_attr::<VarLenUnicode>()
        .create("units")?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 string: {e}")))
}
