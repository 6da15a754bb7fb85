// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use shopflow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("a", false, None), ("b", false, None), ("c", false, None)]);
  pipeline.on_root("a", mark("a"));
  pipeline.on_root("b", mark("b"));
  pipeline.on_root("c", mark("c"));

  let ctx = ContextData::new(LedgerCtx::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["a", "b", "c"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("main", false, None)]);
  pipeline.after_root("main", mark("after"));
  pipeline.on_root("main", mark("on"));
  pipeline.before_root("main", mark("before"));

  let ctx = ContextData::new(LedgerCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().trail, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn stop_signal_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("a", false, None), ("b", false, None), ("c", false, None)]);
  pipeline.on_root("a", mark("a"));
  pipeline.on_root("b", mark("b"));
  pipeline.after_root("b", mark("b_after"));
  pipeline.on_root("c", mark("c"));

  let ctx = ContextData::new(LedgerCtx {
    stop_at: Some("b".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().trail, vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("ok", false, None), ("bad", false, None), ("never", false, None)]);
  pipeline.on_root("ok", mark("ok"));
  pipeline.on_root("bad", fail("bad", "boom"));
  pipeline.on_root("never", mark("never"));

  let ctx = ContextData::new(LedgerCtx::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("boom".to_string()));
  assert_eq!(ctx.read().trail, vec!["ok", "bad"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_against_live_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[
    ("take", false, None),
    (
      "only_if_empty",
      false,
      Some(Arc::new(|ctx: ContextData<LedgerCtx>| ctx.read().available > 0)),
    ),
    ("tail", false, None),
  ]);
  pipeline.on_root("take", hold("take", 3));
  pipeline.on_root("only_if_empty", mark("only_if_empty"));
  pipeline.on_root("tail", mark("tail"));

  let ctx = ContextData::new(LedgerCtx::with_available(5));
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["take", "tail"]);

  let drained = ContextData::new(LedgerCtx::with_available(3));
  pipeline.run(drained.clone()).await.unwrap();
  assert_eq!(drained.read().trail, vec!["take", "only_if_empty", "tail"]);
}

#[tokio::test]
#[serial]
async fn missing_handler_fails_only_for_required_steps() {
  setup_tracing();
  let optional_only = Pipeline::<LedgerCtx, TestError>::new(&[("notify", true, None)]);
  let result = optional_only.run(ContextData::new(LedgerCtx::default())).await;
  assert_eq!(result.unwrap(), PipelineResult::Completed);

  let required = Pipeline::<LedgerCtx, TestError>::new(&[("persist", false, None)]);
  match required.run(ContextData::new(LedgerCtx::default())).await {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("persist"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn pipeline_can_use_flow_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, FlowError>::new(&[("task", false, None)]);
  pipeline.on_root("task", |_ctx: ContextData<LedgerCtx>| {
    Box::pin(async move { Err(FlowError::Internal("deliberate".to_string())) })
  });

  match pipeline.run(ContextData::new(LedgerCtx::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "deliberate"),
    other => panic!("expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn steps_can_be_inserted_and_removed() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("first", false, None), ("last", false, None)]);
  pipeline.insert_after_step("first", "middle", false, None).unwrap();
  pipeline.insert_before_step("first", "zeroth", true, None).unwrap();
  assert_eq!(pipeline.step_names(), vec!["zeroth", "first", "middle", "last"]);

  assert!(matches!(
    pipeline.insert_after_step("first", "last", false, None),
    Err(FlowError::DuplicateStep { .. })
  ));
  assert!(matches!(
    pipeline.remove_step("nope"),
    Err(FlowError::StepNotFound { .. })
  ));

  pipeline.on_root("first", mark("first"));
  pipeline.on_root("middle", mark("middle"));
  pipeline.on_root("last", mark("last"));
  pipeline.remove_step("middle").unwrap();

  let ctx = ContextData::new(LedgerCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn optional_flag_and_skip_condition_can_be_changed() {
  setup_tracing();
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("maybe", false, None), ("always", false, None)]);
  pipeline.on_root("always", mark("always"));
  pipeline.set_optional("maybe", true).unwrap();

  let ctx = ContextData::new(LedgerCtx::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  pipeline
    .set_skip_condition("always", Some(Arc::new(|_ctx: ContextData<LedgerCtx>| true)))
    .unwrap();
  let skipped = ContextData::new(LedgerCtx::default());
  pipeline.run(skipped.clone()).await.unwrap();
  assert!(skipped.read().trail.is_empty());
}

#[test]
#[should_panic(expected = "not part of this pipeline")]
fn registering_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<LedgerCtx, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("unknown", |_ctx: ContextData<LedgerCtx>| {
    Box::pin(async move { Ok::<_, TestError>(PipelineControl::Continue) })
  });
}
