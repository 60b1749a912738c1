use std::collections::{BTreeMap, btree_map};

use worker::Forecast;

/// Actual and predicted values accumulated over a round, always of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesPair {
    actual: Vec<f32>,
    predicted: Vec<f32>,
}

impl SeriesPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a forecast's values.
    pub fn extend(&mut self, forecast: Forecast) {
        let (actual, predicted) = forecast.into_parts();
        self.actual.extend(actual);
        self.predicted.extend(predicted);
    }

    pub fn actual(&self) -> &[f32] {
        &self.actual
    }

    pub fn predicted(&self) -> &[f32] {
        &self.predicted
    }

    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

/// The predictions of one online round: those of the global model on the reference
/// partition and those of every participant on its own partition.
#[derive(Debug, Clone, Default)]
pub struct PredictionLedger {
    global: SeriesPair,
    partitions: BTreeMap<String, SeriesPair>,
}

impl PredictionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_global(&mut self, forecast: Forecast) {
        self.global.extend(forecast);
    }

    /// Appends a participant's forecast, creating its entry on first use.
    pub fn record(&mut self, partition: &str, forecast: Forecast) {
        self.partitions
            .entry(partition.to_string())
            .or_default()
            .extend(forecast);
    }

    pub fn global(&self) -> &SeriesPair {
        &self.global
    }

    pub fn partition(&self, partition: &str) -> Option<&SeriesPair> {
        self.partitions.get(partition)
    }

    /// Every participant's entry, ordered by partition id.
    pub fn partitions(&self) -> btree_map::Iter<'_, String, SeriesPair> {
        self.partitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(actual: &[f32], predicted: &[f32]) -> Forecast {
        Forecast::new(actual.to_vec(), predicted.to_vec()).unwrap()
    }

    #[test]
    fn entries_grow_in_order() {
        let mut ledger = PredictionLedger::new();
        ledger.record("m2", forecast(&[1.0], &[1.5]));
        ledger.record("m1", forecast(&[2.0, 3.0], &[2.0, 2.0]));
        ledger.record("m2", forecast(&[4.0], &[4.5]));
        ledger.record_global(forecast(&[9.0], &[8.0]));

        let m2 = ledger.partition("m2").unwrap();
        assert_eq!(m2.actual(), &[1.0, 4.0]);
        assert_eq!(m2.predicted(), &[1.5, 4.5]);

        let ids: Vec<_> = ledger.partitions().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2"]);
        assert_eq!(ledger.global().len(), 1);
        assert!(ledger.partition("m3").is_none());
    }
}
