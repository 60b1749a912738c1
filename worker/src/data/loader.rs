use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    Result, WorkerErr,
    data::{Partition, Split},
};

/// Finds and reads the partition files of a directory, one CSV file per partition.
#[derive(Debug, Clone)]
pub struct PartitionLoader {
    dir: PathBuf,
    suffix: String,
    column: String,
    split: Split,
    normalize: bool,
}

impl PartitionLoader {
    /// Creates a new `PartitionLoader`.
    ///
    /// # Arguments
    /// * `dir` - The directory holding the partition files.
    /// * `suffix` - The file name suffix shared by every partition file, `{id}{suffix}`.
    /// * `column` - The name of the column holding the series.
    /// * `split` - How each series is divided into train and held out values.
    /// * `normalize` - Whether each series is min/max scaled.
    pub fn new<P, S, C>(dir: P, suffix: S, column: C, split: Split, normalize: bool) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            column: column.into(),
            split,
            normalize,
        }
    }

    /// Lists the ids of every partition file in the directory, sorted.
    pub fn discover(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            let Some(id) = partition_id(name, &self.suffix) else {
                continue;
            };

            if entry.file_type()?.is_file() {
                ids.push(id.to_string());
            }
        }

        if ids.is_empty() {
            return Err(WorkerErr::NoPartitions {
                dir: self.dir.clone(),
            });
        }

        ids.sort_unstable();
        Ok(ids)
    }

    /// The file holding the series of partition `id`.
    pub fn path_of(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{}", self.suffix))
    }

    /// Reads and splits the series of partition `id`.
    pub fn load(&self, id: &str) -> Result<Partition> {
        let path = self.path_of(id);
        let series = read_column(&path, &self.column)?;
        debug!(partition = id, len = series.len(); "loaded partition");

        Partition::new(id, series, self.split, self.normalize)
    }

    /// Reads every partition in `ids`, in order.
    pub fn load_all<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Partition>> {
        ids.iter().map(|id| self.load(id.as_ref())).collect()
    }
}

/// The id of a partition file: its name without `suffix`, so that `path_of` finds the
/// file again.
///
/// # Returns
/// `None` if the name doesn't end in `suffix` or nothing precedes it.
pub fn partition_id<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    file_name
        .strip_suffix(suffix)
        .filter(|id| !id.is_empty())
}

/// Reads a list of partition ids, one per non empty line.
pub fn read_id_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let ids = fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    Ok(ids)
}

/// Reads the values of the column named `column` from a CSV file with headers.
pub fn read_column<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;

    let position = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| WorkerErr::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let raw = record.get(position).unwrap_or_default().trim();

        let value = raw.parse().map_err(|_| WorkerErr::InvalidValue {
            path: path.to_path_buf(),
            line,
            value: raw.to_string(),
        })?;
        values.push(value);
    }

    Ok(values)
}
