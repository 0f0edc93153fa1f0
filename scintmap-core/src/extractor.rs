//! Fractional-energy extraction.
//!
//! Pipeline, applied to [`EventTables`] held fully in memory:
//!
//! 1. keep spectrum records of the configured particle
//! 2. sum energy per `(EventID, CellID)`
//! 3. drop groups with `CellID >= cell_count`
//! 4. divide by each event's total (NaN for zero totals)
//! 5. pivot to one row per EventID, absent cells 0.0
//! 6. left-join the mean muon pre-step position, absent positions 0.0
//! 7. lay out columns as `Cell_0..Cell_{n-1}, x_true, y_true`

use crate::aggregate::{event_totals, fractional_energy, mean_positions, sum_photon_energy};
use crate::config::{ExtractionConfig, ZeroTotalPolicy};
use crate::error::Result;
use crate::record::EventTables;
use crate::table::EnergyMapTable;
use log::{debug, warn};
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counters collected while extracting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractionStatistics {
    pub spectrum_records: usize,
    pub matched_records: usize,
    pub dropped_cell_groups: usize,
    pub muon_steps: usize,
    pub events: usize,
    pub events_without_track: usize,
    pub zero_total_events: usize,
}

/// Builds energy maps from spectrum and muon track tables.
#[derive(Clone, Debug, Default)]
pub struct FractionalEnergyExtractor {
    config: ExtractionConfig,
}

impl FractionalEnergyExtractor {
    /// Create an extractor with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts the energy map table.
    ///
    /// # Errors
    /// Returns an error if either table has ragged columns.
    pub fn extract(&self, tables: &EventTables) -> Result<EnergyMapTable> {
        self.extract_with_statistics(tables).map(|(table, _)| table)
    }

    /// Extracts the energy map table along with pipeline counters.
    ///
    /// # Errors
    /// Returns an error if either table has ragged columns.
    #[allow(clippy::float_cmp)]
    pub fn extract_with_statistics(
        &self,
        tables: &EventTables,
    ) -> Result<(EnergyMapTable, ExtractionStatistics)> {
        tables.validate()?;

        let config = &self.config;
        let photon = sum_photon_energy(
            &tables.spectrum,
            &config.particle_name,
            config.cell_limit(),
        );
        debug!(
            "{} of {} spectrum records are {}; {} groups kept, {} dropped by cell limit",
            photon.matched_records,
            tables.spectrum.len(),
            config.particle_name,
            photon.energy_mev.len(),
            photon.dropped_groups
        );

        let mut zero_total_events = 0usize;
        for (event_id, total) in event_totals(&photon.energy_mev) {
            if total == 0.0 {
                warn!(
                    "event {event_id} has zero total {} energy",
                    config.particle_name
                );
                zero_total_events += 1;
            }
        }

        let fractions = fractional_energy(&photon.energy_mev);

        // BTreeMap keys are ordered, so consecutive dedup yields sorted ids.
        let mut event_ids: Vec<i32> = fractions.keys().map(|&(event_id, _)| event_id).collect();
        event_ids.dedup();

        let mut cells = Array2::<f64>::zeros((event_ids.len(), config.cells()));
        let mut row = 0usize;
        let mut current = event_ids.first().copied();
        for (&(event_id, cell_id), &fraction) in &fractions {
            if Some(event_id) != current {
                row += 1;
                current = Some(event_id);
            }
            // Negative cells count toward the total but have no column.
            let Ok(column) = usize::try_from(cell_id) else {
                continue;
            };
            cells[[row, column]] = match config.zero_total {
                ZeroTotalPolicy::ZeroFill if fraction.is_nan() => 0.0,
                _ => fraction,
            };
        }

        let positions = mean_positions(&tables.muon_track);
        let mut x_true = Vec::with_capacity(event_ids.len());
        let mut y_true = Vec::with_capacity(event_ids.len());
        let mut events_without_track = 0usize;
        for event_id in &event_ids {
            let position = positions.get(event_id).copied().unwrap_or_default();
            if !positions.contains_key(event_id) {
                events_without_track += 1;
            }
            x_true.push(position.x_cm.unwrap_or(0.0));
            y_true.push(position.y_cm.unwrap_or(0.0));
        }
        debug!(
            "{} events, {} without muon track",
            event_ids.len(),
            events_without_track
        );

        let statistics = ExtractionStatistics {
            spectrum_records: tables.spectrum.len(),
            matched_records: photon.matched_records,
            dropped_cell_groups: photon.dropped_groups,
            muon_steps: tables.muon_track.len(),
            events: event_ids.len(),
            events_without_track,
            zero_total_events,
        };

        let table = EnergyMapTable::new(event_ids, cells, x_true, y_true)?;
        Ok((table, statistics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MuonTrackTable, SpectrumTable};
    use approx::assert_relative_eq;

    fn two_event_tables() -> EventTables {
        let mut spectrum = SpectrumTable::default();
        spectrum.push(0, 3, "opticalphoton", 2.0);
        spectrum.push(1, 10, "opticalphoton", 1.0);
        spectrum.push(1, 20, "opticalphoton", 1.0);

        let mut muon_track = MuonTrackTable::default();
        muon_track.push(0, 1.0, 4.0);
        muon_track.push(0, 3.0, 6.0);

        EventTables::new(spectrum, muon_track)
    }

    #[test]
    fn test_two_event_map() {
        let extractor = FractionalEnergyExtractor::default();
        let (table, stats) = extractor
            .extract_with_statistics(&two_event_tables())
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column_count(), 66);

        let a = table.row_by_event(0).unwrap();
        assert_relative_eq!(a.cells[3], 1.0);
        assert_relative_eq!(a.cell_sum(), 1.0);
        assert_relative_eq!(a.x_true, 2.0);
        assert_relative_eq!(a.y_true, 5.0);

        let b = table.row_by_event(1).unwrap();
        assert_relative_eq!(b.cells[10], 0.5);
        assert_relative_eq!(b.cells[20], 0.5);
        assert_relative_eq!(b.cell_sum(), 1.0);
        assert_relative_eq!(b.x_true, 0.0);
        assert_relative_eq!(b.y_true, 0.0);

        assert_eq!(stats.events, 2);
        assert_eq!(stats.events_without_track, 1);
        assert_eq!(stats.zero_total_events, 0);
    }

    #[test]
    fn test_zero_total_policies() {
        let mut tables = two_event_tables();
        tables.spectrum.push(2, 4, "opticalphoton", 0.0);

        let propagate = FractionalEnergyExtractor::default();
        let (table, stats) = propagate.extract_with_statistics(&tables).unwrap();
        let row = table.row_by_event(2).unwrap();
        assert!(row.cells[4].is_nan());
        assert_relative_eq!(row.cells[5], 0.0);
        assert_eq!(table.nan_row_count(), 1);
        assert_eq!(stats.zero_total_events, 1);

        let zero_fill = FractionalEnergyExtractor::new(
            ExtractionConfig::default().with_zero_total(ZeroTotalPolicy::ZeroFill),
        )
        .unwrap();
        let table = zero_fill.extract(&tables).unwrap();
        let row = table.row_by_event(2).unwrap();
        assert_relative_eq!(row.cells[4], 0.0);
        assert_eq!(table.nan_row_count(), 0);
    }

    #[test]
    fn test_track_only_events_are_not_rows() {
        let mut tables = two_event_tables();
        tables.muon_track.push(42, 9.0, 9.0);

        let table = FractionalEnergyExtractor::default()
            .extract(&tables)
            .unwrap();
        assert_eq!(table.event_ids(), &[0, 1]);
    }

    #[test]
    fn test_custom_cell_count() {
        let extractor =
            FractionalEnergyExtractor::new(ExtractionConfig::default().with_cell_count(16))
                .unwrap();
        let table = extractor.extract(&two_event_tables()).unwrap();

        assert_eq!(table.cell_count(), 16);
        let b = table.row_by_event(1).unwrap();
        assert_relative_eq!(b.cells[10], 1.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = FractionalEnergyExtractor::new(ExtractionConfig::default().with_cell_count(0));
        assert!(result.is_err());
    }
}
