use crate::{Result, WorkerErr, data::MinMaxScaler};

/// How a series is divided into its train and held out parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Split {
    /// The first `floor(len × ratio)` values train, the rest are held out.
    Ratio(f64),
    /// The last `n` values are held out.
    Holdout(usize),
}

impl Split {
    /// The amount of training values of a series of length `len`.
    ///
    /// # Returns
    /// An error if either side of the split would be empty.
    pub fn train_len(&self, len: usize) -> Result<usize> {
        let train_len = match *self {
            Split::Ratio(ratio) if !(ratio > 0.0 && ratio < 1.0) => {
                return Err(WorkerErr::InvalidSplit(format!(
                    "the ratio must be in (0, 1), got {ratio}"
                )));
            }
            Split::Ratio(ratio) => (len as f64 * ratio).floor() as usize,
            Split::Holdout(n) if n == 0 || n >= len => {
                return Err(WorkerErr::InvalidSplit(format!(
                    "can't hold out {n} of {len} values"
                )));
            }
            Split::Holdout(n) => len - n,
        };

        if train_len == 0 || train_len == len {
            return Err(WorkerErr::InvalidSplit(format!(
                "{self:?} leaves one side of a {len} value series empty"
            )));
        }

        Ok(train_len)
    }
}

/// The private data of one participant: a time ordered series split into a
/// train part and a held out part.
#[derive(Debug, Clone)]
pub struct Partition {
    id: String,
    train: Vec<f32>,
    test: Vec<f32>,
    scaler: Option<MinMaxScaler>,
}

impl Partition {
    /// Creates a new `Partition`.
    ///
    /// # Arguments
    /// * `id` - The stable identifier of the partition.
    /// * `series` - The whole time ordered series.
    /// * `split` - How to divide the series.
    /// * `normalize` - Whether to min/max scale the series, the scaler is fitted on every value.
    ///
    /// # Returns
    /// The partition or an error if the series is empty or can't be split.
    pub fn new<S: Into<String>>(
        id: S,
        mut series: Vec<f32>,
        split: Split,
        normalize: bool,
    ) -> Result<Self> {
        let id = id.into();

        if series.is_empty() {
            return Err(WorkerErr::EmptySeries { partition: id });
        }

        let scaler = if normalize {
            MinMaxScaler::fit(&series)
        } else {
            None
        };

        if let Some(scaler) = &scaler {
            scaler.transform_all(&mut series);
        }

        let train_len = split.train_len(series.len())?;
        let test = series.split_off(train_len);

        Ok(Self {
            id,
            train: series,
            test,
            scaler,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The training values, scaled if the partition is normalized.
    pub fn train(&self) -> &[f32] {
        &self.train
    }

    /// The held out values, scaled if the partition is normalized.
    pub fn test(&self) -> &[f32] {
        &self.test
    }

    pub fn scaler(&self) -> Option<&MinMaxScaler> {
        self.scaler.as_ref()
    }

    /// Maps model space values back to the series' original units.
    pub fn denormalize(&self, values: &mut [f32]) {
        if let Some(scaler) = &self.scaler {
            scaler.inverse_all(values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32).collect()
    }

    #[test]
    fn ratio_split() {
        let partition = Partition::new("g1", series(10), Split::Ratio(0.8), false).unwrap();
        assert_eq!(partition.train().len(), 8);
        assert_eq!(partition.test(), &[8.0, 9.0]);
    }

    #[test]
    fn holdout_split() {
        let partition = Partition::new("g1", series(10), Split::Holdout(3), false).unwrap();
        assert_eq!(partition.train().len(), 7);
        assert_eq!(partition.test(), &[7.0, 8.0, 9.0]);
    }

    #[test]
    fn degenerate_splits_fail() {
        assert!(Split::Ratio(1.0).train_len(10).is_err());
        assert!(Split::Ratio(0.01).train_len(10).is_err());
        assert!(Split::Holdout(10).train_len(10).is_err());
        assert!(Split::Holdout(0).train_len(10).is_err());
    }

    #[test]
    fn normalization_covers_both_sides() {
        let mut partition = Partition::new("g1", series(5), Split::Holdout(1), true).unwrap();
        assert_eq!(partition.train(), &[0.0, 0.25, 0.5, 0.75]);
        assert_eq!(partition.test(), &[1.0]);

        let mut values = partition.test().to_vec();
        partition.denormalize(&mut values);
        assert_eq!(values, [4.0]);

        partition = Partition::new("g1", series(5), Split::Holdout(1), false).unwrap();
        assert!(partition.scaler().is_none());
    }

    #[test]
    fn empty_series_fails() {
        assert!(matches!(
            Partition::new("g1", Vec::new(), Split::Ratio(0.5), false),
            Err(WorkerErr::EmptySeries { .. })
        ));
    }
}
