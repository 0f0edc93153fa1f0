//! Grouped sums and means over the record tables.
//!
//! Groups are kept in `BTreeMap`s so every downstream step sees events
//! (and cells within an event) in ascending order.

use crate::record::{MuonTrackTable, SpectrumTable};
use std::collections::BTreeMap;

/// `(EventID, CellID)` grouping key.
pub type CellKey = (i32, i32);

/// Summed particle energy per `(EventID, CellID)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotonEnergy {
    /// Summed `EnergyMeV` for every retained `(EventID, CellID)` group.
    pub energy_mev: BTreeMap<CellKey, f64>,
    /// Records whose particle name matched the filter.
    pub matched_records: usize,
    /// Groups removed by the `CellID` limit.
    pub dropped_groups: usize,
}

/// Sums `EnergyMeV` per `(EventID, CellID)` over records of `particle_name`,
/// then drops groups with `CellID >= cell_limit`.
///
/// The cell limit is applied after grouping, so dropped cells never reach
/// the per-event totals computed by [`fractional_energy`].
#[must_use]
pub fn sum_photon_energy(
    spectrum: &SpectrumTable,
    particle_name: &str,
    cell_limit: i32,
) -> PhotonEnergy {
    let mut grouped: BTreeMap<CellKey, f64> = BTreeMap::new();
    let mut matched_records = 0usize;

    let records = spectrum
        .event_id
        .iter()
        .zip(&spectrum.cell_id)
        .zip(&spectrum.particle_name)
        .zip(&spectrum.energy_mev);

    for (((&event_id, &cell_id), name), &energy) in records {
        if name != particle_name {
            continue;
        }
        matched_records += 1;
        *grouped.entry((event_id, cell_id)).or_insert(0.0) += energy;
    }

    let before = grouped.len();
    grouped.retain(|&(_, cell_id), _| cell_id < cell_limit);

    PhotonEnergy {
        dropped_groups: before - grouped.len(),
        energy_mev: grouped,
        matched_records,
    }
}

/// Sums the grouped energies of each event.
#[must_use]
pub fn event_totals(energy_mev: &BTreeMap<CellKey, f64>) -> BTreeMap<i32, f64> {
    let mut totals = BTreeMap::new();
    for (&(event_id, _), &energy) in energy_mev {
        *totals.entry(event_id).or_insert(0.0) += energy;
    }
    totals
}

/// Divides every group by its event's total energy.
///
/// No guard against zero totals: an event whose groups sum to zero gets NaN
/// fractions.
#[must_use]
pub fn fractional_energy(energy_mev: &BTreeMap<CellKey, f64>) -> BTreeMap<CellKey, f64> {
    let totals = event_totals(energy_mev);
    energy_mev
        .iter()
        .map(|(&key, &energy)| {
            let total = totals.get(&key.0).copied().unwrap_or(0.0);
            (key, energy / total)
        })
        .collect()
}

/// Running mean that ignores NaN samples.
#[derive(Clone, Copy, Debug, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: f64) {
        if !value.is_nan() {
            self.sum += value;
            self.count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean pre-step position of an event's muon track.
///
/// A coordinate is `None` when every sample of it was NaN.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeanPosition {
    pub x_cm: Option<f64>,
    pub y_cm: Option<f64>,
}

/// Averages `PreStepX_cm` and `PreStepY_cm` per event.
#[must_use]
pub fn mean_positions(muon_track: &MuonTrackTable) -> BTreeMap<i32, MeanPosition> {
    let mut acc: BTreeMap<i32, (MeanAccumulator, MeanAccumulator)> = BTreeMap::new();

    let steps = muon_track
        .event_id
        .iter()
        .zip(&muon_track.pre_step_x_cm)
        .zip(&muon_track.pre_step_y_cm);

    for ((&event_id, &x), &y) in steps {
        let (ax, ay) = acc.entry(event_id).or_default();
        ax.add(x);
        ay.add(y);
    }

    acc.into_iter()
        .map(|(event_id, (ax, ay))| {
            (
                event_id,
                MeanPosition {
                    x_cm: ax.mean(),
                    y_cm: ay.mean(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spectrum() -> SpectrumTable {
        let mut table = SpectrumTable::default();
        table.push(1, 3, "opticalphoton", 1.5);
        table.push(1, 3, "opticalphoton", 0.5);
        table.push(1, 5, "e-", 10.0);
        table.push(1, 70, "opticalphoton", 4.0);
        table.push(2, 0, "opticalphoton", 1.0);
        table
    }

    #[test]
    fn test_sum_groups_and_filters() {
        let photon = sum_photon_energy(&spectrum(), "opticalphoton", 64);

        assert_eq!(photon.matched_records, 4);
        assert_eq!(photon.dropped_groups, 1);
        assert_eq!(photon.energy_mev.len(), 2);
        assert_relative_eq!(photon.energy_mev[&(1, 3)], 2.0);
        assert_relative_eq!(photon.energy_mev[&(2, 0)], 1.0);
        assert!(!photon.energy_mev.contains_key(&(1, 5)));
        assert!(!photon.energy_mev.contains_key(&(1, 70)));
    }

    #[test]
    fn test_fractions_ignore_dropped_cells() {
        let photon = sum_photon_energy(&spectrum(), "opticalphoton", 64);
        let fractions = fractional_energy(&photon.energy_mev);

        // Cell 70 carried 4 MeV but is not part of event 1's denominator.
        assert_relative_eq!(fractions[&(1, 3)], 1.0);
        assert_relative_eq!(fractions[&(2, 0)], 1.0);
    }

    #[test]
    fn test_zero_total_produces_nan() {
        let mut table = SpectrumTable::default();
        table.push(4, 1, "opticalphoton", 0.0);
        table.push(4, 2, "opticalphoton", 0.0);

        let photon = sum_photon_energy(&table, "opticalphoton", 64);
        let fractions = fractional_energy(&photon.energy_mev);
        assert!(fractions[&(4, 1)].is_nan());
        assert!(fractions[&(4, 2)].is_nan());
    }

    #[test]
    fn test_negative_cell_counts_toward_total() {
        let mut table = SpectrumTable::default();
        table.push(9, -1, "opticalphoton", 1.0);
        table.push(9, 2, "opticalphoton", 3.0);

        let photon = sum_photon_energy(&table, "opticalphoton", 64);
        let fractions = fractional_energy(&photon.energy_mev);
        assert_relative_eq!(fractions[&(9, -1)], 0.25);
        assert_relative_eq!(fractions[&(9, 2)], 0.75);
    }

    #[test]
    fn test_mean_positions_skip_nan() {
        let mut track = MuonTrackTable::default();
        track.push(1, 1.0, 2.0);
        track.push(1, 3.0, f64::NAN);
        track.push(2, f64::NAN, f64::NAN);

        let means = mean_positions(&track);
        assert_relative_eq!(means[&1].x_cm.unwrap(), 2.0);
        assert_relative_eq!(means[&1].y_cm.unwrap(), 2.0);
        assert_eq!(means[&2], MeanPosition::default());
    }
}
