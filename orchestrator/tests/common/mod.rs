#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use machine_learning::ParameterSet;
use ndarray::array;
use worker::{ExecContext, Forecast, LocalTrainer, LocalUpdate, WorkerErr};

/// A parameter set with a single two value tensor.
pub fn params(value: f32) -> ParameterSet {
    let mut params = ParameterSet::new();
    params.insert("w", array![value, value]);
    params
}

pub fn value_of(params: &ParameterSet) -> f32 {
    *params.get("w").unwrap().first().unwrap()
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Returns the received parameters plus `shift`.
    Shift(f32),
    /// Returns a constant parameter value.
    Constant(f32),
    Fail,
    Sleep(Duration),
}

/// A local trainer over no real data.
///
/// Forecasts are `actual = cursor + i` and `predicted = actual + error`.
pub struct Stub {
    id: String,
    behavior: Behavior,
    loss: f32,
    error: f32,
    test_len: usize,
    calls: AtomicUsize,
}

impl Stub {
    pub fn new(id: &str, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            behavior,
            loss: 1.0,
            error: 1.0,
            test_len: 100,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_loss(mut self, loss: f32) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_error(mut self, error: f32) -> Self {
        self.error = error;
        self
    }

    pub fn with_test_len(mut self, test_len: usize) -> Self {
        self.test_len = test_len;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl LocalTrainer for Stub {
    fn id(&self) -> &str {
        &self.id
    }

    fn test_len(&self) -> usize {
        self.test_len
    }

    fn update_weights(
        &self,
        params: ParameterSet,
        _round: usize,
        _ctx: &ExecContext,
    ) -> worker::Result<LocalUpdate> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let params = match self.behavior {
            Behavior::Shift(shift) => params
                .iter()
                .map(|(k, t)| (k.clone(), t.mapv(|v| v + shift)))
                .collect(),
            Behavior::Constant(value) => params
                .iter()
                .map(|(k, t)| (k.clone(), t.mapv(|_| value)))
                .collect(),
            Behavior::Fail => {
                return Err(WorkerErr::EmptySeries {
                    partition: self.id.clone(),
                });
            }
            Behavior::Sleep(duration) => {
                thread::sleep(duration);
                params
            }
        };

        Ok(LocalUpdate {
            params,
            loss: self.loss,
        })
    }

    fn infer(
        &self,
        cursor: usize,
        _params: &ParameterSet,
        _ctx: &ExecContext,
    ) -> worker::Result<Forecast> {
        let actual: Vec<f32> = (0..10).map(|i| (cursor + i) as f32).collect();
        let predicted = actual.iter().map(|a| a + self.error).collect();
        Forecast::new(actual, predicted)
    }
}

/// Upcasts stubs into the trainer list an orchestrator takes.
pub fn trainers(stubs: &[Arc<Stub>]) -> Vec<Arc<dyn LocalTrainer>> {
    stubs
        .iter()
        .map(|stub| Arc::clone(stub) as Arc<dyn LocalTrainer>)
        .collect()
}
