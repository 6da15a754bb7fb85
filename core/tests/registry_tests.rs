// tests/registry_tests.rs
mod common;

use common::*;
use shopflow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default)]
struct SignupCtx {
  email: String,
  accepted: bool,
}

#[derive(Clone, Debug, Default)]
struct RestockCtx {
  units: i32,
}

fn signup_pipeline() -> Pipeline<SignupCtx, TestError> {
  let mut p = Pipeline::<SignupCtx, TestError>::new(&[("check_email", false, None)]);
  p.on_root("check_email", |ctx: ContextData<SignupCtx>| {
    Box::pin(async move {
      let ok = ctx.read().email.contains('@');
      if !ok {
        return Err(TestError::Handler("bad email".to_string()));
      }
      ctx.write().accepted = true;
      Ok(PipelineControl::Continue)
    })
  });
  p
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register_pipeline(signup_pipeline());

  let mut restock = Pipeline::<RestockCtx, TestError>::new(&[("add", false, None)]);
  restock.on_root("add", |ctx: ContextData<RestockCtx>| {
    Box::pin(async move {
      ctx.write().units += 5;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
  });
  registry.register_pipeline(restock);

  let signup = ContextData::new(SignupCtx {
    email: "a@b.c".to_string(),
    ..Default::default()
  });
  assert_eq!(registry.run(signup.clone()).await.unwrap(), PipelineResult::Completed);
  assert!(signup.read().accepted);

  let stock = ContextData::new(RestockCtx { units: 1 });
  registry.run(stock.clone()).await.unwrap();
  assert_eq!(stock.read().units, 6);

  assert!(registry.is_registered::<RestockCtx>());
  assert_eq!(registry.steps_of::<SignupCtx>(), Some(vec!["check_email".to_string()]));
}

#[tokio::test]
async fn unregistered_context_is_a_configuration_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  #[derive(Default)]
  struct Orphan;

  match registry.run(ContextData::new(Orphan)).await {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("ConfigurationError"));
      assert!(s.contains("Orphan"));
    }
    other => panic!("expected ConfigurationError, got {:?}", other),
  }
  assert!(registry.steps_of::<Orphan>().is_none());
}

#[tokio::test]
async fn handler_errors_pass_through_registry() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register_pipeline(signup_pipeline());

  let result = registry
    .run(ContextData::new(SignupCtx {
      email: "nope".to_string(),
      ..Default::default()
    }))
    .await;
  assert_eq!(result.unwrap_err(), TestError::Handler("bad email".to_string()));
}

#[tokio::test]
async fn default_registry_uses_flow_error() {
  setup_tracing();
  let registry: FlowRegistry = FlowRegistry::default();

  let mut p = Pipeline::<RestockCtx, FlowError>::new(&[("noop", true, None)]);
  p.on_root("noop", |_ctx: ContextData<RestockCtx>| {
    Box::pin(async move { Ok::<_, FlowError>(PipelineControl::Continue) })
  });
  registry.register_pipeline(p);

  assert!(registry.run(ContextData::new(RestockCtx::default())).await.is_ok());
}
