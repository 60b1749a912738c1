use std::{num::NonZeroUsize, ops::Range};

use ndarray::{Array2, ArrayView2, Axis, s};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// Sliding window samples over a time series: each row of `x` holds `window`
/// consecutive values and the matching row of `y` holds the value right after them.
#[derive(Debug, Clone)]
pub struct WindowDataset {
    x: Array2<f32>,
    y: Array2<f32>,
}

impl WindowDataset {
    /// Creates a new `WindowDataset` from a series.
    ///
    /// # Arguments
    /// * `series` - The time ordered values.
    /// * `window` - The amount of past values used as input.
    ///
    /// # Returns
    /// The dataset or an error if the series can't hold a single window and its target.
    pub fn from_series(series: &[f32], window: usize) -> Result<Self> {
        if window == 0 || series.len() <= window {
            return Err(MlErr::WindowTooLarge {
                window,
                len: series.len(),
            });
        }

        let n = series.len() - window;
        let x = Array2::from_shape_fn((n, window), |(i, j)| series[i + j]);
        let y = Array2::from_shape_fn((n, 1), |(i, _)| series[i + window]);

        Ok(Self { x, y })
    }

    /// The amount of samples.
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the samples in `range`, clipped to the dataset's length.
    pub fn rows(&self, range: Range<usize>) -> (ArrayView2<'_, f32>, ArrayView2<'_, f32>) {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        (
            self.x.slice(s![start..end, ..]),
            self.y.slice(s![start..end, ..]),
        )
    }

    /// Shuffles the order of the samples.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);

        self.x = self.x.select(Axis(0), &order);
        self.y = self.y.select(Axis(0), &order);
    }

    /// Splits the dataset into consecutive batches of at most `batch_size` samples.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        self.x
            .axis_chunks_iter(Axis(0), batch_size.get())
            .zip(self.y.axis_chunks_iter(Axis(0), batch_size.get()))
    }
}
