use std::sync::Arc;

use log::{debug, info};
use machine_learning::ParameterSet;
use parameter_server::{Aggregator, FedAvg, GlobalModel, ParticipantSelector};
use rand::rngs::StdRng;
use serde::Serialize;
use worker::{ExecContext, LocalTrainer};

use crate::{
    OrchestratorError, Result,
    dispatch::{Completed, DispatchOptions, Dispatcher},
};

/// The phases a round goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    SelectingParticipants,
    DispatchingLocal,
    Aggregating,
    UpdatingGlobal,
    RoundComplete,
    Finished,
}

/// The mean local loss of a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundLoss {
    pub epoch: usize,
    pub locals_loss_avg: f32,
}

/// Drives the federated rounds: select participants, train them locally from the
/// global parameters, aggregate their results and replace the global parameters.
///
/// Rounds are strictly sequential, a round only starts once the previous one
/// replaced the global parameters.
pub struct RoundOrchestrator<A: Aggregator = FedAvg> {
    trainers: Vec<Arc<dyn LocalTrainer>>,
    selector: ParticipantSelector,
    aggregator: A,
    dispatcher: Dispatcher,
    global: GlobalModel,
    ctx: ExecContext,
    rng: StdRng,
    state: RoundState,
    history: Vec<RoundLoss>,
}

impl RoundOrchestrator {
    /// Creates a new `RoundOrchestrator` that aggregates with `FedAvg`.
    ///
    /// # Arguments
    /// * `trainers` - Every partition that may be selected.
    /// * `selector` - Picks the participants of each round.
    /// * `params` - The initial global parameters.
    /// * `ctx` - The execution context handed to every local step.
    /// * `options` - How failing and slow participants are treated.
    pub fn new(
        trainers: Vec<Arc<dyn LocalTrainer>>,
        selector: ParticipantSelector,
        params: ParameterSet,
        ctx: ExecContext,
        options: DispatchOptions,
    ) -> Self {
        Self::with_aggregator(FedAvg::new(), trainers, selector, params, ctx, options)
    }
}

impl<A: Aggregator> RoundOrchestrator<A> {
    /// Creates a new `RoundOrchestrator` with a custom aggregation rule.
    pub fn with_aggregator(
        aggregator: A,
        trainers: Vec<Arc<dyn LocalTrainer>>,
        selector: ParticipantSelector,
        params: ParameterSet,
        ctx: ExecContext,
        options: DispatchOptions,
    ) -> Self {
        Self {
            trainers,
            selector,
            aggregator,
            dispatcher: Dispatcher::new(options),
            global: GlobalModel::new(params),
            rng: ctx.rng("selection"),
            ctx,
            state: RoundState::Idle,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// The losses of every finished round, in order.
    pub fn history(&self) -> &[RoundLoss] {
        &self.history
    }

    pub fn global(&self) -> &GlobalModel {
        &self.global
    }

    pub fn trainers(&self) -> &[Arc<dyn LocalTrainer>] {
        &self.trainers
    }

    pub fn ctx(&self) -> &ExecContext {
        &self.ctx
    }

    /// The number of the next round.
    pub fn next_epoch(&self) -> usize {
        self.history.len()
    }

    /// Runs `rounds` rounds and finishes.
    ///
    /// # Returns
    /// The loss history, or the first error that aborted a round.
    pub async fn run(&mut self, rounds: usize) -> Result<&[RoundLoss]> {
        for _ in 0..rounds {
            self.round().await?;
        }

        self.finish();
        Ok(&self.history)
    }

    /// Runs a single round.
    pub async fn round(&mut self) -> Result<RoundLoss> {
        let epoch = self.next_epoch();
        let participants = self.select()?;

        let ctx = self.ctx;
        let completed = self
            .dispatch(epoch, &participants, move |trainer, params| {
                trainer.update_weights(params, epoch, &ctx)
            })
            .await?;

        let (params, losses): (Vec<_>, Vec<_>) = completed
            .into_iter()
            .map(|c| (c.value.params, c.value.loss))
            .unzip();

        self.update(&params)?;
        Ok(self.complete(epoch, &losses))
    }

    /// Marks the orchestrator as done.
    pub fn finish(&mut self) {
        self.transition(RoundState::Finished);
    }

    /// Consumes the orchestrator, returning the global parameters.
    pub fn into_params(self) -> ParameterSet {
        self.global.into_params()
    }

    pub(crate) fn select(&mut self) -> Result<Vec<Arc<dyn LocalTrainer>>> {
        self.transition(RoundState::SelectingParticipants);

        let indices = self.selector.select(self.trainers.len(), &mut self.rng)?;
        if indices.is_empty() {
            return Err(OrchestratorError::EmptySelection {
                round: self.next_epoch(),
            });
        }

        let participants: Vec<_> = indices
            .into_iter()
            .map(|i| Arc::clone(&self.trainers[i]))
            .collect();

        info!(
            epoch = self.next_epoch(),
            participants = participants.len();
            "selected participants"
        );

        Ok(participants)
    }

    pub(crate) async fn dispatch<T, F>(
        &mut self,
        epoch: usize,
        participants: &[Arc<dyn LocalTrainer>],
        step: F,
    ) -> Result<Vec<Completed<T>>>
    where
        T: Send + 'static,
        F: Fn(&dyn LocalTrainer, ParameterSet) -> worker::Result<T> + Send + Sync + 'static,
    {
        self.transition(RoundState::DispatchingLocal);
        self.dispatcher
            .dispatch(epoch, participants, self.global.params(), step)
            .await
    }

    /// Aggregates the participants' parameters into the new global parameters.
    pub(crate) fn update(&mut self, params: &[ParameterSet]) -> Result<()> {
        self.transition(RoundState::Aggregating);
        let aggregate = self.aggregator.aggregate(params)?;

        self.transition(RoundState::UpdatingGlobal);
        self.global.replace(aggregate)?;
        Ok(())
    }

    pub(crate) fn complete(&mut self, epoch: usize, losses: &[f32]) -> RoundLoss {
        self.transition(RoundState::RoundComplete);

        let locals_loss_avg = losses.iter().sum::<f32>() / losses.len() as f32;
        let loss = RoundLoss {
            epoch,
            locals_loss_avg,
        };

        info!(epoch = epoch, loss = locals_loss_avg; "finished round");
        self.history.push(loss);
        loss
    }

    fn transition(&mut self, next: RoundState) {
        debug!(from:? = self.state, to:? = next; "round state");
        self.state = next;
    }
}
