mod common;

use std::{num::NonZeroUsize, sync::Arc};

use common::{Behavior, Stub, params, trainers};
use machine_learning::initialization::Init;
use orchestrator::{DispatchOptions, OnlineOrchestrator, OrchestratorError, RoundOrchestrator};
use parameter_server::ParticipantSelector;
use rand::{SeedableRng, rngs::StdRng};
use worker::{
    ExecContext, LocalTrainer, SeriesTrainer, WorkerConfig,
    data::{Partition, Split},
};

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn take_all() -> ParticipantSelector {
    ParticipantSelector::from_options(true, None, 1.0).unwrap()
}

fn online(stubs: &[Arc<Stub>], reference: Arc<Stub>) -> OnlineOrchestrator {
    let rounds = RoundOrchestrator::new(
        trainers(stubs),
        take_all(),
        params(0.0),
        ExecContext::new(Some(3)),
        DispatchOptions::default(),
    );

    OnlineOrchestrator::new(rounds, reference, 100, 10, nz(20)).unwrap()
}

#[tokio::test]
async fn rounds_walk_the_rolling_cursor() {
    let stubs = [
        Stub::new("m1", Behavior::Shift(1.0)).with_error(2.0).shared(),
        Stub::new("m2", Behavior::Shift(1.0)).with_error(-2.0).shared(),
    ];
    let reference = Stub::new("g1", Behavior::Fail).shared();
    let mut online = online(&stubs, Arc::clone(&reference));

    let reports = online.run(1).await.unwrap();
    let report = &reports[0];

    assert_eq!(report.steps, 5);
    assert_eq!(stubs[0].calls(), 5);
    // The reference partition only forecasts.
    assert_eq!(reference.calls(), 0);
    assert_eq!(online.rounds().global().version(), 5);

    assert!((report.global.rmse - 1.0).abs() < 1e-9);
    assert!((report.global.mae - 1.0).abs() < 1e-9);

    assert_eq!(report.partitions.len(), 2);
    assert!((report.partitions["m1"].rmse - 2.0).abs() < 1e-9);
    assert!((report.partitions["m2"].mae - 2.0).abs() < 1e-9);

    // Actual values span 0..=89 over the whole round.
    assert!((report.global.nrmse - 1.0 / 89.0).abs() < 1e-9);
}

#[tokio::test]
async fn warm_up_rounds_come_first() {
    let stubs = [Stub::new("m1", Behavior::Shift(0.0)).with_loss(0.5).shared()];
    let reference = Stub::new("g1", Behavior::Shift(0.0)).shared();
    let mut online = online(&stubs, reference);

    online.warm_up(2).await.unwrap();
    let reports = online.run(2).await.unwrap();

    assert_eq!(stubs[0].calls(), 2 + 2 * 5);
    assert_eq!(reports[0].loss.epoch, 2);
    assert_eq!(reports[1].loss.epoch, 3);
    assert_eq!(reports[0].online_epoch, 0);
    assert_eq!(reports[1].online_epoch, 1);
    assert_eq!(online.rounds().history().len(), 4);
    assert!(online.rounds().history().iter().all(|l| l.locals_loss_avg == 0.5));
}

#[test]
fn the_first_window_must_fit() {
    let rounds = RoundOrchestrator::new(
        Vec::new(),
        take_all(),
        params(0.0),
        ExecContext::default(),
        DispatchOptions::default(),
    );
    let reference = Stub::new("g1", Behavior::Fail).shared();

    assert!(matches!(
        OnlineOrchestrator::new(rounds, reference, 10, 10, nz(5)),
        Err(OrchestratorError::InvalidConfig(_))
    ));
}

#[test]
fn every_partition_must_hold_out_test_len_values() {
    let stubs = [
        Stub::new("m1", Behavior::Shift(0.0)).shared(),
        Stub::new("m2", Behavior::Shift(0.0)).with_test_len(60).shared(),
    ];
    let rounds = RoundOrchestrator::new(
        trainers(&stubs),
        take_all(),
        params(0.0),
        ExecContext::default(),
        DispatchOptions::default(),
    );
    let reference = Stub::new("g1", Behavior::Shift(0.0)).shared();

    let err = OnlineOrchestrator::new(rounds, reference, 100, 10, nz(20)).err();
    assert!(matches!(err, Some(OrchestratorError::InvalidConfig(ref msg)) if msg.contains("m2")));
}

#[test]
fn a_short_reference_is_rejected() {
    let rounds = RoundOrchestrator::new(
        Vec::new(),
        take_all(),
        params(0.0),
        ExecContext::default(),
        DispatchOptions::default(),
    );
    let reference = Stub::new("g1", Behavior::Fail).with_test_len(50).shared();

    assert!(matches!(
        OnlineOrchestrator::new(rounds, reference, 100, 10, nz(20)),
        Err(OrchestratorError::InvalidConfig(_))
    ));
}

fn series_trainer(id: &str, phase: f32) -> SeriesTrainer {
    let series = (0..120)
        .map(|t| 50.0 + 20.0 * (t as f32 * 0.3 + phase).sin())
        .collect();
    let partition = Partition::new(id, series, Split::Holdout(40), true).unwrap();

    let config = WorkerConfig {
        local_epochs: nz(1),
        window_size: nz(4),
        hidden_size: nz(6),
        learning_rate: 0.1,
        batch_size: nz(8),
        test_range: nz(10),
    };

    SeriesTrainer::new(partition, config)
}

#[tokio::test]
async fn series_trainers_run_end_to_end() {
    let participants: Vec<Arc<dyn LocalTrainer>> = ["m1", "m2", "m3"]
        .iter()
        .enumerate()
        .map(|(i, id)| Arc::new(series_trainer(id, i as f32)) as Arc<dyn LocalTrainer>)
        .collect();
    let reference = Arc::new(series_trainer("g1", 0.5));

    assert_eq!(participants[0].test_len(), 40);

    let mut rng = StdRng::seed_from_u64(8);
    let initial = reference
        .config()
        .forecaster()
        .build()
        .init(&Init::XavierUniform, &mut rng)
        .unwrap();

    let rounds = RoundOrchestrator::new(
        participants,
        take_all(),
        initial.clone(),
        ExecContext::new(Some(8)),
        DispatchOptions::default(),
    );
    let mut online = OnlineOrchestrator::new(rounds, reference, 40, 4, nz(10)).unwrap();

    online.warm_up(2).await.unwrap();
    let report = online.round().await.unwrap();

    assert_eq!(report.steps, 4);
    assert_eq!(report.partitions.len(), 3);
    assert!(report.global.rmse.is_finite());
    assert!(report.partitions.values().all(|m| m.mae.is_finite()));
    assert!(online.rounds().global().params().same_layout(&initial));
}
