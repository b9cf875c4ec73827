use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use membervisor::{
    Config, Orchestrator, Phase, RuntimeError, TaskError, TaskFailure, TaskFn,
};
use tokio_util::sync::CancellationToken;

fn orchestrator() -> Arc<Orchestrator> {
    Orchestrator::builder(Config::default()).build()
}

async fn collect(orch: &Orchestrator, mut errors: membervisor::ErrorStream) -> Vec<TaskFailure> {
    orch.drain(Some(Duration::from_secs(5))).await.unwrap();
    let mut out = Vec::new();
    while let Some(f) = errors.next().await {
        out.push(f);
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_all_complete_before_drain_returns() {
    let orch = orchestrator();
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..64u64 {
        let done = Arc::clone(&done);
        orch.dispatch(TaskFn::boxed("work", move |_ctx: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(i % 7)).await;
            done.fetch_add(1, Ordering::SeqCst);
            Ok::<(), TaskError>(())
        }))
        .unwrap();
    }

    orch.drain(None).await.unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 64);
    assert_eq!(orch.in_flight(), 0);
    assert_eq!(orch.phase(), Phase::Drained);

    // Already drained: returns at once.
    orch.drain(Some(Duration::from_millis(1))).await.unwrap();
}

#[tokio::test]
async fn dispatch_after_drain_is_rejected_and_not_run() {
    let orch = orchestrator();
    orch.drain(None).await.unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&ran);
    let err = orch
        .dispatch(TaskFn::boxed("late", move |_ctx: CancellationToken| async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok::<(), TaskError>(())
        }))
        .unwrap_err();

    assert_eq!(err, RuntimeError::ShuttingDown { task: "late".into() });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(orch.in_flight(), 0);
}

async fn explode() -> Result<(), TaskError> {
    panic!("renderer crashed")
}

#[tokio::test]
async fn panicking_task_is_reported_and_does_not_block_drain() {
    let orch = orchestrator();
    let errors = orch.observe_errors();

    orch.dispatch(TaskFn::boxed("manual", |_ctx: CancellationToken| explode()))
        .unwrap();

    let failures = collect(&orch, errors).await;
    assert_eq!(failures.len(), 1);
    assert_eq!(&*failures[0].task, "manual");
    match &failures[0].error {
        TaskError::Panicked { info } => assert!(info.contains("renderer crashed")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(orch.in_flight(), 0);
}

#[tokio::test]
async fn only_failing_tasks_reach_the_error_stream() {
    let orch = orchestrator();
    let errors = orch.observe_errors();

    orch.dispatch(TaskFn::boxed("task1", |_ctx: CancellationToken| async {
        Err::<(), TaskError>(TaskError::fail("first"))
    }))
    .unwrap();
    orch.dispatch(TaskFn::boxed("task2", |_ctx: CancellationToken| async {
        Ok::<(), TaskError>(())
    }))
    .unwrap();
    orch.dispatch(TaskFn::boxed("task3", |_ctx: CancellationToken| async {
        Err::<(), TaskError>(TaskError::fail("third"))
    }))
    .unwrap();

    let mut names: Vec<String> = collect(&orch, errors)
        .await
        .into_iter()
        .map(|f| f.task.to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["task1", "task3"]);
}

#[tokio::test]
async fn every_observer_sees_every_failure() {
    let orch = orchestrator();
    let first = orch.observe_errors();
    let second = orch.observe_errors();

    orch.dispatch(TaskFn::boxed("invoice", |_ctx: CancellationToken| async {
        Err::<(), TaskError>(TaskError::fail("smtp down"))
    }))
    .unwrap();

    let a = collect(&orch, first).await;
    let b = collect(&orch, second).await;
    assert_eq!(a.len(), 1);
    assert_eq!(a, b);
}

#[tokio::test]
async fn drain_twice_is_idempotent() {
    let orch = orchestrator();
    orch.dispatch(TaskFn::boxed("quick", |_ctx: CancellationToken| async {
        Ok::<(), TaskError>(())
    }))
    .unwrap();

    orch.drain(None).await.unwrap();
    orch.drain(None).await.unwrap();
    assert_eq!(orch.phase(), Phase::Drained);
}

#[tokio::test]
async fn bounded_drain_times_out_then_succeeds_later() {
    let orch = orchestrator();
    orch.dispatch(TaskFn::boxed("slow", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_millis(600)).await;
        Ok::<(), TaskError>(())
    }))
    .unwrap();

    let err = orch
        .drain(Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    match err {
        RuntimeError::DrainTimeout {
            in_flight, stuck, ..
        } => {
            assert_eq!(in_flight, 1);
            assert_eq!(stuck, vec!["slow".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(orch.phase(), Phase::Draining);

    let rejected = orch.dispatch(TaskFn::boxed("late", |_ctx: CancellationToken| async {
        Ok::<(), TaskError>(())
    }));
    assert!(matches!(rejected, Err(RuntimeError::ShuttingDown { .. })));

    orch.drain(None).await.unwrap();
    assert_eq!(orch.phase(), Phase::Drained);
    assert_eq!(orch.in_flight(), 0);
}

#[tokio::test]
async fn task_timeout_is_reported_as_failure() {
    let cfg = Config {
        task_timeout: Duration::from_millis(50),
        ..Config::default()
    };
    let orch = Orchestrator::builder(cfg).build();
    let errors = orch.observe_errors();

    orch.dispatch(TaskFn::boxed("hung", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<(), TaskError>(())
    }))
    .unwrap();

    let failures = collect(&orch, errors).await;
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].error, TaskError::Timeout { .. }));
}

#[tokio::test]
async fn stream_opened_after_drain_is_empty() {
    let orch = orchestrator();
    orch.drain(None).await.unwrap();
    let mut errors = orch.observe_errors();
    assert!(errors.next().await.is_none());
}

#[tokio::test]
async fn successful_tasks_do_not_crowd_out_failures() {
    let cfg = Config {
        bus_capacity: 8,
        ..Config::default()
    };
    let orch = Orchestrator::builder(cfg).build();
    let errors = orch.observe_errors();

    orch.dispatch(TaskFn::boxed("task1", |_ctx: CancellationToken| async {
        Err::<(), TaskError>(TaskError::fail("smtp down"))
    }))
    .unwrap();
    for _ in 0..5 {
        orch.dispatch(TaskFn::boxed("ok", |_ctx: CancellationToken| async {
            Ok::<(), TaskError>(())
        }))
        .unwrap();
    }

    let names: Vec<String> = collect(&orch, errors)
        .await
        .into_iter()
        .map(|f| f.task.to_string())
        .collect();
    assert_eq!(names, vec!["task1"]);
}

#[tokio::test]
async fn oversized_bus_capacity_builds_clamped() {
    let cfg = Config {
        bus_capacity: usize::MAX,
        ..Config::default()
    };
    let orch = Orchestrator::builder(cfg).build();
    orch.drain(None).await.unwrap();
}
