use std::{fs, path::Path};

use orchestrator::configs::{FailurePolicy, FederationConfig, RunMode};

fn write_partition(dir: &Path, id: &str, phase: f32) {
    let mut contents = String::from("time,group_value\n");
    for t in 0..120 {
        let value = 30.0 + 10.0 * (t as f32 * 0.25 + phase).sin();
        contents.push_str(&format!("{t},{value}\n"));
    }
    fs::write(dir.join(format!("{id}_val.csv")), contents).unwrap();
}

fn config(root: &Path) -> FederationConfig {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    for (i, id) in ["g1", "m1", "m2", "m3"].iter().enumerate() {
        write_partition(&data, id, i as f32);
    }

    let mut config = FederationConfig {
        global_epochs: 2,
        local_epochs: 1,
        window_size: 4,
        test_range: 10,
        take_all: true,
        ..FederationConfig::default()
    };
    config.data.dir = data;
    config.model.hidden_size = 4;
    config.model.batch_size = 8;
    config.execution.seed = Some(21);
    config.execution.results_dir = root.join("results");
    config.execution.failure_policy = FailurePolicy::Abort;
    config.validate().unwrap();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_run_writes_losses_and_checkpoint() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(root.path());
    let checkpoint = root.path().join("global.safetensors");
    config.execution.checkpoint = Some(checkpoint.clone());

    let params = fedforecast::run(&config).await.unwrap();

    let losses_path = root.path().join("results/federated-train-avg-loss.csv");
    let losses = fs::read_to_string(losses_path).unwrap();
    assert_eq!(losses.lines().count(), 1 + 2);
    assert!(losses.starts_with("epoch,locals_loss_avg\n"));
    assert!(checkpoint.exists());

    config.global_epochs = 1;
    config.execution.resume_from = Some(checkpoint);
    config.execution.checkpoint = None;
    let resumed = fedforecast::run(&config).await.unwrap();
    assert!(resumed.same_layout(&params));
}

#[tokio::test(flavor = "multi_thread")]
async fn online_run_writes_metrics() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(root.path());
    config.mode = RunMode::Online;
    config.test_len = Some(40);
    config.online_epochs = 2;
    config.validate().unwrap();

    fedforecast::run(&config).await.unwrap();

    let results = root.path().join("results");
    let losses_path = results.join("online-federated-g1-train-avg-loss-t10.csv");
    let losses = fs::read_to_string(losses_path).unwrap();
    assert_eq!(losses.lines().count(), 1 + 2 + 2);

    // metric files count online rounds only, warm up rounds are not numbered
    assert!(results.join("online-federated-global-e1-t10.csv").exists());
    assert!(!results.join("online-federated-global-e2-t10.csv").exists());
    assert!(!results.join("online-federated-local-g1-e2-t10.csv").exists());

    let global = fs::read_to_string(results.join("online-federated-global-e0-t10.csv")).unwrap();
    assert!(global.starts_with("group_id,RMSE,NRMSE,MAE\ng1,"));

    let local = fs::read_to_string(results.join("online-federated-local-g1-e0-t10.csv")).unwrap();
    let meters: Vec<_> = local
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(meters, ["m1", "m2", "m3"]);
}

#[tokio::test]
async fn resuming_from_a_foreign_checkpoint_fails() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(root.path());

    let mut other = machine_learning::ParameterSet::new();
    other.insert("w", ndarray::array![0.0, 0.0, 0.0]);
    let path = root.path().join("other.safetensors");
    parameter_server::storage::checkpoint::save(&other, &path).unwrap();

    config.execution.resume_from = Some(path);
    assert!(fedforecast::run(&config).await.is_err());
}
