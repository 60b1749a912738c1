/// Rescales values linearly so the fitted series spans `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f32,
    max: f32,
}

impl MinMaxScaler {
    /// Fits a scaler to the range of `values`.
    ///
    /// # Returns
    /// `None` if `values` is empty.
    pub fn fit(values: &[f32]) -> Option<Self> {
        let (&first, rest) = values.split_first()?;

        let (min, max) = rest
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));

        Some(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    // A constant series maps to 0 and back to its only value.
    fn range(&self) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 { 1.0 } else { range }
    }

    pub fn transform(&self, value: f32) -> f32 {
        (value - self.min) / self.range()
    }

    pub fn inverse(&self, value: f32) -> f32 {
        value * self.range() + self.min
    }

    /// Scales every value in place.
    pub fn transform_all(&self, values: &mut [f32]) {
        values.iter_mut().for_each(|v| *v = self.transform(*v));
    }

    /// Maps every value back to the original units in place.
    pub fn inverse_all(&self, values: &mut [f32]) {
        values.iter_mut().for_each(|v| *v = self.inverse(*v));
    }
}
