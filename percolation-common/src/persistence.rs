//! CSV storage of ensembles: one row of comma separated densities per run, no header.

use crate::sim_params::SimParams;
use crate::trajectory::{DensityTrajectory, Ensemble, TrajectorySink};
use anyhow::{Context, Result};
use chrono::{Local, NaiveTime};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Local wall-clock time of day, used to tag a session's output files.
pub fn session_time() -> NaiveTime {
    Local::now().time()
}

/// File stem encoding the parameters and the session start, e.g.
/// `perco_p0.644700_N1000_T1000_M100_17--41--10`.
pub fn ensemble_file_stem(base: &str, params: &SimParams, time: NaiveTime) -> String {
    format!(
        "{}_p{:.6}_N{}_T{}_M{}_{}",
        base,
        params.bond_probability,
        params.lattice_size,
        params.iterations,
        params.runs,
        time.format("%H--%M--%S")
    )
}

/// Appends one row per finished run and flushes it right away, so the file
/// holds every completed run even if the session dies part way.
pub struct CsvTrajectoryWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvTrajectoryWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Failed to create CSV file '{}'", path.display()))?;
        Ok(Self {
            writer,
            path,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn write(&mut self, trajectory: &DensityTrajectory) -> Result<()> {
        self.writer
            // Debug formatting keeps the `.0` on whole densities
            .write_record(trajectory.iter().map(|d| format!("{d:?}")))
            .with_context(|| format!("Failed to write row to '{}'", self.path.display()))?;
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush '{}'", self.path.display()))?;
        self.rows_written += 1;
        Ok(())
    }
}

impl TrajectorySink for CsvTrajectoryWriter {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> Result<()> {
        self.write(trajectory)?;
        debug!("Run {} written to {}", run_index + 1, self.path.display());
        Ok(())
    }
}

/// Loads a CSV ensemble back into memory. Ragged rows and non-numeric cells are errors.
pub fn read_ensemble<P: AsRef<Path>>(path: P) -> Result<Ensemble> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file '{}'", path.display()))?;

    let mut ensemble = Ensemble::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {} of '{}'", row + 1, path.display()))?;
        let values = record
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                cell.trim().parse::<f64>().with_context(|| {
                    format!("Row {}, column {}: '{}' is not a number", row + 1, col + 1, cell)
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        ensemble
            .push(DensityTrajectory::from_values(values))
            .with_context(|| format!("Row {} of '{}'", row + 1, path.display()))?;
    }
    Ok(ensemble)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("percolation-common-{}-{}", std::process::id(), name))
    }

    #[test]
    fn file_stem_encodes_parameters_and_time() {
        let params = SimParams::new(1000, 1000, 100, 0.6447).unwrap();
        let time = NaiveTime::from_hms_opt(17, 41, 10).unwrap();
        assert_eq!(
            ensemble_file_stem("perco", &params, time),
            "perco_p0.644700_N1000_T1000_M100_17--41--10"
        );
    }

    #[test]
    fn file_stem_pads_early_hours() {
        let params = SimParams::new(10, 5, 2, 0.5).unwrap();
        let time = NaiveTime::from_hms_opt(3, 4, 5).unwrap();
        assert_eq!(
            ensemble_file_stem("run", &params, time),
            "run_p0.500000_N10_T5_M2_03--04--05"
        );
    }

    #[test]
    fn session_time_follows_local_clock() {
        let before = Local::now().time();
        let session = session_time();
        let after = Local::now().time();
        // A UTC clock would sit a whole zone offset away on non-UTC hosts.
        let near = |a: NaiveTime, b: NaiveTime| {
            let diff = (a - b).num_seconds().rem_euclid(86_400);
            diff <= 2 || diff >= 86_398
        };
        assert!(near(session, before) || near(session, after), "{session} vs {before}..{after}");
    }

    #[test]
    fn whole_densities_keep_decimal_point() {
        let path = temp_path("decimal.csv");
        {
            let mut writer = CsvTrajectoryWriter::create(&path).unwrap();
            writer.write(&DensityTrajectory::from_values(vec![1.0, 0.5, 0.0])).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text.trim_end(), "1.0,0.5,0.0");
    }

    #[test]
    fn written_rows_read_back_as_ensemble() {
        let path = temp_path("roundtrip.csv");
        let rows = vec![vec![1.0, 0.5, 0.25], vec![1.0, 0.9, 0.1]];
        {
            let mut writer = CsvTrajectoryWriter::create(&path).unwrap();
            for (i, row) in rows.iter().enumerate() {
                writer.accept(i, &DensityTrajectory::from_values(row.clone())).unwrap();
            }
            assert_eq!(writer.rows_written(), 2);
        }
        let ensemble = read_ensemble(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ensemble.len(), 2);
        let read: Vec<Vec<f64>> = ensemble.iter().map(|t| t.values().to_vec()).collect();
        assert_eq!(read, rows);
    }

    #[test]
    fn ragged_file_is_rejected() {
        let path = temp_path("ragged.csv");
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "1.0,0.5,0.2").unwrap();
            writeln!(file, "1.0,0.5").unwrap();
        }
        let err = read_ensemble(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("Row 2"), "{err:#}");
    }

    #[test]
    fn non_numeric_cell_is_rejected() {
        let path = temp_path("garbage.csv");
        std::fs::write(&path, "1.0,abc\n").unwrap();
        let err = read_ensemble(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("abc"), "{err}");
    }

    #[test]
    fn empty_file_gives_empty_ensemble() {
        let path = temp_path("empty.csv");
        std::fs::write(&path, "").unwrap();
        let ensemble = read_ensemble(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(ensemble.is_empty());
    }
}
