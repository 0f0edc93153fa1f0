use scintmap_core::{EventTables, MuonTrackTable, SpectrumTable};
use scintmap_io::{write_event_tables_hdf5, Hdf5WriteOptions};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_input(dir: &Path) -> PathBuf {
    let mut spectrum = SpectrumTable::default();
    spectrum.push(12, 0, "opticalphoton", 3.0e-6);
    spectrum.push(12, 1, "opticalphoton", 1.0e-6);
    spectrum.push(13, 63, "opticalphoton", 2.0e-6);

    let mut muon_track = MuonTrackTable::default();
    muon_track.push(12, 0.5, 0.25);

    let path = dir.join("tomography_output.h5");
    write_event_tables_hdf5(
        &path,
        &EventTables::new(spectrum, muon_track),
        &Hdf5WriteOptions::default(),
    )
    .unwrap();
    path
}

fn scintmap(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scintmap"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_process_default_output() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path());

    let out = scintmap(dir.path(), &["process", "tomography_output.h5"]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Data saved to energy_maps_with_labels.csv"));
    assert!(stdout.contains("[2 rows x 66 columns]"));

    let csv = std::fs::read_to_string(dir.path().join("energy_maps_with_labels.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Cell_0,Cell_1,Cell_2,"));
    assert!(lines[0].ends_with(",Cell_63,x_true,y_true"));
    assert!(lines[1].starts_with("0.750000,0.250000,0.000000,"));
    assert!(lines[1].ends_with(",0.500000,0.250000"));
    assert!(lines[2].ends_with(",1.000000,0.000000,0.000000"));
}

#[test]
fn test_process_without_preview() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path());

    let out = scintmap(
        dir.path(),
        &["process", "tomography_output.h5", "maps.csv", "--preview", "0"],
    );
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.trim(), "Data saved to maps.csv");
    assert!(dir.path().join("maps.csv").exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    let out = scintmap(dir.path(), &["process", "absent.h5"]);
    assert!(!out.status.success());
    assert!(!dir.path().join("energy_maps_with_labels.csv").exists());
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    write_input(dir.path());

    let out = scintmap(dir.path(), &["info", "tomography_output.h5", "--json"]);
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let tables: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tables = tables.as_array().unwrap();
    assert_eq!(tables.len(), 2);
    assert!(tables
        .iter()
        .any(|t| t["name"] == "SpectrumData" && t["rows"] == 3));
}
