//! Federated training of a time series forecaster over independent partitions.

use std::{env, path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, Result, bail};
use log::info;
use machine_learning::ParameterSet;
use orchestrator::{
    OnlineOrchestrator, Reporter, RoundOrchestrator,
    configs::{Adapter, FederationConfig, RunMode},
};
use parameter_server::storage::checkpoint;
use worker::{LocalTrainer, SeriesTrainer, data::read_id_list};

/// The environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "FEDFORECAST_CONFIG";

/// The configuration file used when none is given.
pub const DEFAULT_CONFIG: &str = "federation.json";

/// The configuration file path: the first argument, then `FEDFORECAST_CONFIG`, then
/// `federation.json`.
pub fn config_path() -> PathBuf {
    env::args_os()
        .nth(1)
        .or_else(|| env::var_os(CONFIG_ENV))
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from)
}

/// Runs a whole federation as configured and writes its results.
///
/// # Returns
/// The final global parameters.
pub async fn run(config: &FederationConfig) -> Result<ParameterSet> {
    let start = Instant::now();
    let adapter = Adapter::new(config);
    let worker_config = adapter.worker_config()?;
    let loader = adapter.loader();

    let mut ids = match &config.data.id_list {
        Some(path) => read_id_list(path)
            .with_context(|| format!("reading partition ids from {}", path.display()))?,
        None => loader.discover()?,
    };

    // The reference partition evaluates the global model, it never trains.
    if config.mode == RunMode::Online {
        ids.retain(|id| *id != config.data.reference);
    }

    if ids.is_empty() {
        bail!("no partitions to train on");
    }

    info!(partitions = ids.len(); "loading partitions");
    let trainers: Vec<Arc<dyn LocalTrainer>> = loader
        .load_all(&ids)?
        .into_iter()
        .map(|partition| {
            let trainer = SeriesTrainer::new(partition, worker_config);
            Arc::new(trainer) as Arc<dyn LocalTrainer>
        })
        .collect();

    let params = initial_params(config, &adapter)?;
    let rounds = RoundOrchestrator::new(
        trainers,
        adapter.selector()?,
        params,
        adapter.exec_context(),
        adapter.dispatch_options(),
    );

    let reporter = Reporter::new(&config.execution.results_dir)?;
    let params = match config.mode {
        RunMode::Offline => run_offline(config, rounds, &reporter).await?,
        RunMode::Online => {
            let reference = loader
                .load(&config.data.reference)
                .context("loading the reference partition")?;
            let reference = Arc::new(SeriesTrainer::new(reference, worker_config));
            run_online(config, rounds, reference, &reporter).await?
        }
    };

    if let Some(path) = &config.execution.checkpoint {
        checkpoint::save(&params, path)?;
    }

    info!(elapsed:? = start.elapsed(); "total run time");
    Ok(params)
}

/// The initial global parameters: a checkpoint if resuming, a fresh initialization otherwise.
fn initial_params(config: &FederationConfig, adapter: &Adapter<'_>) -> Result<ParameterSet> {
    let mut rng = adapter.exec_context().rng("init");
    let fresh = adapter.forecaster().build().init(&adapter.init(), &mut rng)?;

    let Some(path) = &config.execution.resume_from else {
        return Ok(fresh);
    };

    let params = checkpoint::load(path)?;
    if !params.same_layout(&fresh) {
        bail!(
            "checkpoint {} doesn't match the configured forecaster",
            path.display()
        );
    }

    info!(path:? = path; "resuming from checkpoint");
    Ok(params)
}

async fn run_offline(
    config: &FederationConfig,
    mut rounds: RoundOrchestrator,
    reporter: &Reporter,
) -> Result<ParameterSet> {
    rounds.run(config.global_epochs).await?;
    reporter.offline_losses(rounds.history())?;
    Ok(rounds.into_params())
}

async fn run_online(
    config: &FederationConfig,
    rounds: RoundOrchestrator,
    reference: Arc<SeriesTrainer>,
    reporter: &Reporter,
) -> Result<ParameterSet> {
    let test_len = config.holdout().unwrap_or_else(|| reference.test_len());
    let window_size = reference.config().window_size.get();
    let test_range = reference.config().test_range;

    let mut online = OnlineOrchestrator::new(rounds, reference, test_len, window_size, test_range)?;

    online.warm_up(config.global_epochs).await?;
    info!("started online training");
    let reports = online.run(config.online_epochs).await?;

    let reference = &config.data.reference;
    for report in &reports {
        reporter.online_round(reference, config.test_range, report)?;
    }

    let rounds = online.into_rounds();
    reporter.online_losses(reference, config.test_range, rounds.history())?;
    Ok(rounds.into_params())
}
