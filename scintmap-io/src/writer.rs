//! CSV writer for energy map tables.

use crate::{Error, Result};
use log::info;
use scintmap_core::EnergyMapTable;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Formatting options for CSV output.
#[derive(Clone, Debug)]
pub struct CsvWriteOptions {
    /// Digits after the decimal point.
    pub float_precision: usize,
    pub delimiter: u8,
    /// Text written for NaN values.
    pub nan_repr: String,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            float_precision: 6,
            delimiter: b',',
            nan_repr: "NaN".to_string(),
        }
    }
}

impl CsvWriteOptions {
    /// Set the number of decimals.
    #[must_use]
    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the NaN representation.
    #[must_use]
    pub fn with_nan_repr(mut self, repr: impl Into<String>) -> Self {
        self.nan_repr = repr.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.float_precision > 17 {
            return Err(Error::CoreError(scintmap_core::Error::ConfigError(format!(
                "float precision {} exceeds 17 digits",
                self.float_precision
            ))));
        }
        Ok(())
    }

    fn format(&self, value: f64) -> String {
        if value.is_nan() {
            self.nan_repr.clone()
        } else {
            format!("{value:.prec$}", prec = self.float_precision)
        }
    }
}

/// Writes energy map rows as delimited text.
///
/// The header lists the table's columns; the EventID index is not written.
pub struct EnergyMapCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    options: CsvWriteOptions,
}

impl<W: Write> EnergyMapCsvWriter<W> {
    /// Wraps a writer.
    ///
    /// # Errors
    /// Returns an error if the options are invalid.
    pub fn from_writer(inner: W, options: CsvWriteOptions) -> Result<Self> {
        options.validate()?;
        let writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(inner);
        Ok(Self { writer, options })
    }

    /// Writes the header row followed by one row per event.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_table(&mut self, table: &EnergyMapTable) -> Result<()> {
        let options = &self.options;
        self.writer.write_record(table.column_names())?;
        for row in table.rows() {
            self.writer
                .write_record(row.values().map(|v| options.format(v)))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    /// Returns an error if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

/// Writes a table to `path`, replacing any existing file.
///
/// The CSV text is rendered in memory first, so a formatting failure
/// leaves no file behind.
///
/// # Errors
/// Returns an error if the options are invalid or the file cannot be written.
pub fn write_energy_map_csv<P: AsRef<Path>>(
    path: P,
    table: &EnergyMapTable,
    options: &CsvWriteOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = EnergyMapCsvWriter::from_writer(Vec::new(), options.clone())?;
    writer.write_table(table)?;
    let bytes = writer.into_inner()?;
    fs::write(path, bytes)?;
    info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::NamedTempFile;

    fn sample() -> EnergyMapTable {
        EnergyMapTable::new(
            vec![1, 2],
            array![[0.25, 0.75], [f64::NAN, 0.0]],
            vec![1.5, 0.0],
            vec![-0.25, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_write_energy_map_csv() {
        let file = NamedTempFile::new().unwrap();
        write_energy_map_csv(file.path(), &sample(), &CsvWriteOptions::default()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Cell_0,Cell_1,x_true,y_true");
        assert_eq!(lines[1], "0.250000,0.750000,1.500000,-0.250000");
        assert_eq!(lines[2], "NaN,0.000000,0.000000,0.000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_custom_options() {
        let options = CsvWriteOptions::default()
            .with_float_precision(2)
            .with_delimiter(b';')
            .with_nan_repr("");
        let mut writer = EnergyMapCsvWriter::from_writer(Vec::new(), options).unwrap();
        writer.write_table(&sample()).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert!(text.starts_with("Cell_0;Cell_1;x_true;y_true\n"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "0.25;0.75;1.50;-0.25");
        assert_eq!(lines[2], ";0.00;0.00;0.00");
    }

    #[test]
    fn test_invalid_precision() {
        let options = CsvWriteOptions::default().with_float_precision(40);
        assert!(EnergyMapCsvWriter::from_writer(Vec::new(), options).is_err());
    }
}
