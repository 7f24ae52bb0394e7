// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one CSV row per finished epoch:
//
//   epoch,mean_loss,weighted_loss,batches,examples
//   1,0.693147,0.693147,2,4
//   2,0.651200,0.648931,2,4
//
// mean_loss is the reported epoch loss (unweighted mean over
// batches); weighted_loss weights each batch by its size.
// The header is written only when the file is created, so
// repeated runs append to the same log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::ml::trainer::EpochReport;

const HEADER: &str = "epoch,mean_loss,weighted_loss,batches,examples";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Unweighted mean of the batch losses
    pub mean_loss: f64,

    /// Batch losses weighted by batch size
    pub weighted_loss: f64,

    pub batches: usize,
    pub examples: usize,
}

impl From<&EpochReport> for EpochMetrics {
    fn from(report: &EpochReport) -> Self {
        Self {
            epoch:         report.epoch,
            mean_loss:     report.loss.mean(),
            weighted_loss: report.loss.weighted_mean(),
            batches:       report.loss.num_batches(),
            examples:      report.loss.num_examples(),
        }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or create, with header) the CSV at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = path.as_ref().to_path_buf();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics file '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open metrics file '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch, m.mean_loss, m.weighted_loss, m.batches, m.examples,
        )?;

        tracing::debug!("Logged epoch {} metrics: mean_loss={:.4}", m.epoch, m.mean_loss);
        Ok(())
    }

    /// Append every report in order.
    pub fn log_all(&self, reports: &[EpochReport]) -> Result<()> {
        reports.iter().try_for_each(|r| self.log(&EpochMetrics::from(r)))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::EpochLoss;

    fn report(epoch: usize, batches: &[(f64, usize)]) -> EpochReport {
        let mut loss = EpochLoss::new();
        for (l, n) in batches {
            loss.push(*l, *n);
        }
        EpochReport { epoch, loss }
    }

    #[test]
    fn test_rows_follow_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("runs/metrics.csv")).unwrap();
        logger
            .log_all(&[report(1, &[(1.0, 2), (0.5, 2)]), report(2, &[])])
            .unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,0.750000,0.750000,2,4");
        assert_eq!(lines[2], "2,0.000000,0.000000,0,0");
    }

    #[test]
    fn test_reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        MetricsLogger::new(&path).unwrap().log_all(&[report(1, &[(2.0, 1)])]).unwrap();
        MetricsLogger::new(&path).unwrap().log_all(&[report(1, &[(1.0, 1)])]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| *l == HEADER).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }
}
