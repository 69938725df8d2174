#![cfg(all(test, unix))]
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use interlace_common::target::TargetSet;
use interlace_core::{
    PoolSettings, PoolState, SubstitutionContext, TaskGenerator, TaskStatus, WorkerPool,
};
use tokio::sync::watch;

use crate::util::{Recorder, no_stop};

fn generator(targets: &[&str], templates: &[&str]) -> TaskGenerator {
    TaskGenerator::new(
        targets.iter().copied().collect::<TargetSet>(),
        templates.iter().map(|t| t.to_string()).collect(),
        SubstitutionContext::default(),
        1,
    )
}

#[tokio::test]
async fn slow_task_times_out_and_the_pool_moves_on() {
    let pool = WorkerPool::new(PoolSettings::new(1, Duration::from_secs(1)));
    let recorder = Arc::new(Recorder::default());
    let started = Instant::now();

    let summary = pool
        .run(
            generator(&["x"], &["sleep 5", "echo _target_"]),
            recorder.clone(),
            no_stop(),
        )
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(4), "{:?}", started.elapsed());
    let outcomes = recorder.outcomes();
    assert_eq!(outcomes[0].status, TaskStatus::TimedOut);
    assert!(outcomes[0].elapsed >= Duration::from_secs(1));
    assert_eq!(outcomes[1].status, TaskStatus::Succeeded);
    assert_eq!(outcomes[1].stdout.trim(), "x");
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.state, PoolState::Done);
}

#[tokio::test]
async fn more_threads_than_tasks_finishes() {
    let pool = WorkerPool::new(PoolSettings::new(5, Duration::from_secs(10)));
    let recorder = Arc::new(Recorder::default());

    let summary = tokio::time::timeout(
        Duration::from_secs(10),
        pool.run(generator(&["a", "b", "c"], &["sleep 0.2"]), recorder.clone(), no_stop()),
    )
    .await
    .expect("pool deadlocked")
    .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 3);
    assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(recorder.announced.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn live_processes_never_exceed_the_thread_count() {
    let targets: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    let generator = TaskGenerator::new(
        targets.into_iter().collect(),
        vec!["sleep 0.1; echo _target_".to_string()],
        SubstitutionContext::default(),
        1,
    );
    let pool = WorkerPool::new(PoolSettings::new(3, Duration::from_secs(10)));
    let recorder = Arc::new(Recorder::default());

    let summary = pool.run(generator, recorder.clone(), no_stop()).await.unwrap();

    assert_eq!(summary.succeeded, 12);
    assert!(recorder.peak.load(Ordering::SeqCst) <= 3);
    let stdout: Vec<String> = recorder
        .outcomes()
        .iter()
        .map(|outcome| outcome.stdout.trim().to_string())
        .collect();
    let expected: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    assert_eq!(stdout, expected);
}

#[tokio::test]
async fn failing_commands_do_not_stop_the_run() {
    let pool = WorkerPool::new(PoolSettings::new(2, Duration::from_secs(10)));
    let recorder = Arc::new(Recorder::default());

    let summary = pool
        .run(
            generator(&["a", "b"], &["exit 4", "echo ok"]),
            recorder.clone(),
            no_stop(),
        )
        .await
        .unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 2);
    let outcomes = recorder.outcomes();
    assert_eq!(outcomes[0].status, TaskStatus::Failed { code: Some(4) });
    assert_eq!(outcomes[1].status, TaskStatus::Succeeded);
}

#[tokio::test]
async fn stop_signal_cancels_running_commands() {
    let pool = WorkerPool::new(PoolSettings::new(2, Duration::from_secs(30)));
    let recorder = Arc::new(Recorder::default());
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        stop_tx.send_replace(true);
    });

    let started = Instant::now();
    let summary = pool
        .run(generator(&["a", "b", "c", "d"], &["sleep 10"]), recorder.clone(), stop_rx)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary.state, PoolState::Cancelled);
    assert_eq!(summary.cancelled, 2);
    assert_eq!(summary.finished(), 2);
}

#[tokio::test]
async fn timed_out_tasks_leave_no_processes_behind() {
    let dir = tempfile::tempdir().unwrap();
    let template = format!("(sleep 1; touch {}/_target_) ; true", dir.path().display());
    let pool = WorkerPool::new(PoolSettings::new(1, Duration::from_millis(200)));
    let recorder = Arc::new(Recorder::default());

    let summary = pool
        .run(generator(&["a", "b", "c"], &[template.as_str()]), recorder.clone(), no_stop())
        .await
        .unwrap();

    assert_eq!(summary.timed_out, 3);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
