//! CSV result files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{Result, metrics::ErrorMetrics, online::OnlineRoundReport, round::RoundLoss};

const METRIC_HEADERS: [&str; 3] = ["RMSE", "NRMSE", "MAE"];

/// Writes the results of a run into a directory.
#[derive(Debug, Clone)]
pub struct Reporter {
    dir: PathBuf,
}

impl Reporter {
    /// Creates a new `Reporter`, creating `dir` if needed.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the round losses of an offline run.
    pub fn offline_losses(&self, losses: &[RoundLoss]) -> Result<PathBuf> {
        let path = self.dir.join("federated-train-avg-loss.csv");
        write_losses(&path, losses)?;
        Ok(path)
    }

    /// Writes the round losses of an online run.
    ///
    /// # Arguments
    /// * `reference` - The id of the reference partition.
    /// * `test_range` - The step of the rolling cursor.
    /// * `losses` - The losses of every round, warm up included.
    pub fn online_losses(
        &self,
        reference: &str,
        test_range: usize,
        losses: &[RoundLoss],
    ) -> Result<PathBuf> {
        let name = format!("online-federated-{reference}-train-avg-loss-t{test_range}.csv");
        let path = self.dir.join(name);
        write_losses(&path, losses)?;
        Ok(path)
    }

    /// Writes the global and per participant errors of an online round.
    ///
    /// Files are numbered by the online round, so the first one after warm up is `e0`.
    pub fn online_round(
        &self,
        reference: &str,
        test_range: usize,
        report: &OnlineRoundReport,
    ) -> Result<(PathBuf, PathBuf)> {
        let epoch = report.online_epoch;

        let global = self
            .dir
            .join(format!("online-federated-global-e{epoch}-t{test_range}.csv"));
        write_metrics(&global, "group_id", [(reference, &report.global)])?;

        let local = self
            .dir
            .join(format!("online-federated-local-{reference}-e{epoch}-t{test_range}.csv"));
        let rows = report
            .partitions
            .iter()
            .map(|(id, metrics)| (id.as_str(), metrics));
        write_metrics(&local, "meter_id", rows)?;

        Ok((global, local))
    }
}

/// Writes an `epoch,locals_loss_avg` file.
pub fn write_losses<P: AsRef<Path>>(path: P, losses: &[RoundLoss]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    for loss in losses {
        writer.serialize(loss)?;
    }

    writer.flush()?;
    info!(path:? = path, rows = losses.len(); "wrote losses");
    Ok(())
}

/// Writes a `{id_header},RMSE,NRMSE,MAE` file.
pub fn write_metrics<'a, P, I>(path: P, id_header: &str, rows: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a str, &'a ErrorMetrics)>,
{
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once(id_header).chain(METRIC_HEADERS))?;

    for (id, metrics) in rows {
        writer.write_record([
            id.to_string(),
            metrics.rmse.to_string(),
            metrics.nrmse.to_string(),
            metrics.mae.to_string(),
        ])?;
    }

    writer.flush()?;
    info!(path:? = path; "wrote metrics");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn loss_files_have_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path().join("results")).unwrap();

        let losses = [
            RoundLoss {
                epoch: 0,
                locals_loss_avg: 0.5,
            },
            RoundLoss {
                epoch: 1,
                locals_loss_avg: 0.25,
            },
        ];
        let path = reporter.offline_losses(&losses).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "epoch,locals_loss_avg\n0,0.5\n1,0.25\n");
    }

    #[test]
    fn online_round_files() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = Reporter::new(dir.path()).unwrap();

        let metrics = ErrorMetrics {
            rmse: 1.0,
            nrmse: 0.5,
            mae: 0.75,
        };
        let report = OnlineRoundReport {
            online_epoch: 1,
            loss: RoundLoss {
                epoch: 2,
                locals_loss_avg: 0.1,
            },
            steps: 3,
            global: metrics,
            partitions: BTreeMap::from([("7".to_string(), metrics), ("3".to_string(), metrics)]),
        };

        let (global, local) = reporter.online_round("g1", 48, &report).unwrap();
        assert!(global.ends_with("online-federated-global-e1-t48.csv"));
        assert!(local.ends_with("online-federated-local-g1-e1-t48.csv"));

        assert_eq!(
            fs::read_to_string(global).unwrap(),
            "group_id,RMSE,NRMSE,MAE\ng1,1,0.5,0.75\n"
        );
        assert_eq!(
            fs::read_to_string(local).unwrap(),
            "meter_id,RMSE,NRMSE,MAE\n3,1,0.5,0.75\n7,1,0.5,0.75\n"
        );
    }
}
