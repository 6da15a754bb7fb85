// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use shopflow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// A toy reservation ledger: steps take units out of `available` and record
/// what they took in `held`, compensators give it back.
#[derive(Clone, Debug, Default)]
pub struct LedgerCtx {
  pub available: i32,
  pub held: Vec<(String, i32)>,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
}

impl LedgerCtx {
  pub fn with_available(available: i32) -> Self {
    Self {
      available,
      ..Default::default()
    }
  }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  // FlowError is not PartialEq, so tests compare its Debug text.
  #[error("engine error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that appends `label` to the trail, honouring `stop_at`.
pub fn mark(label: &'static str) -> shopflow::Handler<LedgerCtx, TestError> {
  Box::new(move |ctx: ContextData<LedgerCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", label, "marked");
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

/// Handler that takes `units` from the ledger or fails if not enough remain.
pub fn hold(label: &'static str, units: i32) -> shopflow::Handler<LedgerCtx, TestError> {
  Box::new(move |ctx: ContextData<LedgerCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(label.to_string());
      if guard.available < units {
        return Err(TestError::Handler(format!("{} wants {} of {}", label, units, guard.available)));
      }
      guard.available -= units;
      guard.held.push((label.to_string(), units));
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn fail(label: &'static str, message: &'static str) -> shopflow::Handler<LedgerCtx, TestError> {
  Box::new(move |ctx: ContextData<LedgerCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      tracing::warn!(target: "test_handlers", label, "failing on purpose");
      Err(TestError::Handler(message.to_string()))
    })
  })
}

/// Compensator that returns whatever `label` holds to the ledger.
pub fn release(label: &'static str) -> shopflow::Compensator<LedgerCtx, TestError> {
  Box::new(move |ctx: ContextData<LedgerCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      let mut returned = 0;
      guard.held.retain(|(who, units)| {
        if who == label {
          returned += units;
          false
        } else {
          true
        }
      });
      guard.available += returned;
      guard.trail.push(format!("undo:{}", label));
      Ok(())
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
