//! In-memory energy map table.

use crate::error::{Error, Result};
use ndarray::{s, Array2, ArrayView1};
use std::fmt;

/// Name of the x label column.
pub const X_TRUE: &str = "x_true";
/// Name of the y label column.
pub const Y_TRUE: &str = "y_true";
/// Name of the row index.
pub const EVENT_ID: &str = "EventID";

/// Returns the column name of a cell, e.g. `Cell_7`.
#[must_use]
pub fn cell_column_name(cell: usize) -> String {
    format!("Cell_{cell}")
}

/// One row per event: cell fractions followed by the true muon position.
///
/// Rows are sorted by ascending EventID. The EventID is the row index and
/// not one of the table's columns.
#[derive(Clone, Debug, PartialEq)]
pub struct EnergyMapTable {
    event_ids: Vec<i32>,
    cells: Array2<f64>,
    x_true: Vec<f64>,
    y_true: Vec<f64>,
}

/// Borrowed view of a single table row.
#[derive(Clone, Debug)]
pub struct EnergyMapRow<'a> {
    pub event_id: i32,
    pub cells: ArrayView1<'a, f64>,
    pub x_true: f64,
    pub y_true: f64,
}

impl EnergyMapRow<'_> {
    /// Sum of the cell fractions (NaN if any cell is NaN).
    #[must_use]
    pub fn cell_sum(&self) -> f64 {
        self.cells.sum()
    }

    /// Returns true if any cell fraction is NaN.
    #[must_use]
    pub fn has_nan(&self) -> bool {
        self.cells.iter().any(|v| v.is_nan())
    }

    /// All column values in output order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells
            .iter()
            .copied()
            .chain([self.x_true, self.y_true])
    }
}

impl EnergyMapTable {
    /// Builds a table from its index and columns.
    ///
    /// # Errors
    /// Returns [`Error::ColumnLengthMismatch`] if the row counts disagree.
    pub fn new(
        event_ids: Vec<i32>,
        cells: Array2<f64>,
        x_true: Vec<f64>,
        y_true: Vec<f64>,
    ) -> Result<Self> {
        let expected = event_ids.len();
        for (column, found) in [
            ("cells", cells.nrows()),
            (X_TRUE, x_true.len()),
            (Y_TRUE, y_true.len()),
        ] {
            if found != expected {
                return Err(Error::ColumnLengthMismatch {
                    table: "EnergyMap",
                    column,
                    expected,
                    found,
                });
            }
        }
        Ok(Self {
            event_ids,
            cells,
            x_true,
            y_true,
        })
    }

    /// Number of events (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.event_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.event_ids.is_empty()
    }

    /// Number of cell columns.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of data columns (cells plus `x_true` and `y_true`).
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.cell_count() + 2
    }

    /// Column names in output order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        (0..self.cell_count())
            .map(cell_column_name)
            .chain([X_TRUE.to_string(), Y_TRUE.to_string()])
            .collect()
    }

    #[must_use]
    pub fn event_ids(&self) -> &[i32] {
        &self.event_ids
    }

    /// The `events x cells` fraction matrix.
    #[must_use]
    pub fn cells(&self) -> &Array2<f64> {
        &self.cells
    }

    #[must_use]
    pub fn x_true(&self) -> &[f64] {
        &self.x_true
    }

    #[must_use]
    pub fn y_true(&self) -> &[f64] {
        &self.y_true
    }

    /// Returns the row at `index`, if any.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<EnergyMapRow<'_>> {
        let event_id = *self.event_ids.get(index)?;
        Some(EnergyMapRow {
            event_id,
            cells: self.cells.row(index),
            x_true: self.x_true[index],
            y_true: self.y_true[index],
        })
    }

    /// Returns the row of `event_id`, if present.
    #[must_use]
    pub fn row_by_event(&self, event_id: i32) -> Option<EnergyMapRow<'_>> {
        let index = self.event_ids.binary_search(&event_id).ok()?;
        self.row(index)
    }

    /// Iterates over rows in EventID order.
    pub fn rows(&self) -> impl Iterator<Item = EnergyMapRow<'_>> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// Returns the first `n` rows as a new table.
    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            event_ids: self.event_ids[..n].to_vec(),
            cells: self.cells.slice(s![..n, ..]).to_owned(),
            x_true: self.x_true[..n].to_vec(),
            y_true: self.y_true[..n].to_vec(),
        }
    }

    /// Number of rows containing at least one NaN cell.
    #[must_use]
    pub fn nan_row_count(&self) -> usize {
        self.rows().filter(EnergyMapRow::has_nan).count()
    }

    /// Formats the first `rows` rows for console display.
    #[must_use]
    pub fn preview(&self, rows: usize) -> Preview<'_> {
        Preview { table: self, rows }
    }
}

/// Console rendering of the leading rows, EventID included.
///
/// Wide tables show the first and last three cells with an ellipsis
/// column between them.
pub struct Preview<'a> {
    table: &'a EnergyMapTable,
    rows: usize,
}

const PREVIEW_EDGE: usize = 3;
const PREVIEW_WIDTH: usize = 10;

impl Preview<'_> {
    fn visible_cells(&self) -> Vec<Option<usize>> {
        let n = self.table.cell_count();
        if n <= 2 * PREVIEW_EDGE + 1 {
            (0..n).map(Some).collect()
        } else {
            (0..PREVIEW_EDGE)
                .map(Some)
                .chain([None])
                .chain((n - PREVIEW_EDGE..n).map(Some))
                .collect()
        }
    }
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.visible_cells();
        let w = PREVIEW_WIDTH;

        write!(f, "{EVENT_ID:>w$}")?;
        for column in &columns {
            match column {
                Some(cell) => write!(f, " {:>w$}", cell_column_name(*cell))?,
                None => write!(f, " {:>w$}", "...")?,
            }
        }
        writeln!(f, " {X_TRUE:>w$} {Y_TRUE:>w$}")?;

        for row in self.table.rows().take(self.rows) {
            write!(f, "{:>w$}", row.event_id)?;
            for column in &columns {
                match column {
                    Some(cell) => write!(f, " {:>w$.6}", row.cells[*cell])?,
                    None => write!(f, " {:>w$}", "...")?,
                }
            }
            writeln!(f, " {:>w$.6} {:>w$.6}", row.x_true, row.y_true)?;
        }

        write!(
            f,
            "[{} rows x {} columns]",
            self.table.len(),
            self.table.column_count()
        )
    }
}
