// shopflow/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its structural editing methods.

use crate::core::handler::{Compensator, Handler};
use crate::core::step::{SkipCondition, StepDef};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// An ordered set of named steps over a root context `TData`.
///
/// Handlers return `Result<_, Err>`. `Err` must absorb `FlowError` so that
/// engine-level failures (such as a missing handler) surface through the same
/// error type the application already handles.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,

  // Undo actions, keyed by the step whose effects they reverse.
  pub(crate) compensators: HashMap<String, Vec<Compensator<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from `(name, optional, skip_if)` triples, in run order.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef::new(*name, *optional, skip_if.clone()))
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      compensators: HashMap::new(),
    }
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn position_of(&self, step_name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == step_name)
  }

  /// Hook registration against an unknown step is a wiring bug, not a runtime
  /// condition, so it panics with the offending name.
  pub(crate) fn assert_step_exists(&self, step_name: &str) {
    if self.position_of(step_name).is_none() {
      panic!("shopflow setup error: step '{}' is not part of this pipeline", step_name);
    }
  }

  fn locate(&self, step_name: &str) -> FlowResult<usize> {
    self.position_of(step_name).ok_or_else(|| FlowError::StepNotFound {
      step_name: step_name.to_string(),
    })
  }

  fn check_new_name(&self, step_name: &str) -> FlowResult<()> {
    match self.position_of(step_name) {
      Some(_) => Err(FlowError::DuplicateStep {
        step_name: step_name.to_string(),
      }),
      None => Ok(()),
    }
  }

  pub fn insert_before_step(
    &mut self,
    existing_step_name: &str,
    new_step_name: impl Into<String>,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) -> FlowResult<()> {
    let idx = self.locate(existing_step_name)?;
    let name = new_step_name.into();
    self.check_new_name(&name)?;
    self.steps.insert(idx, StepDef::new(name, optional, skip_if));
    Ok(())
  }

  pub fn insert_after_step(
    &mut self,
    existing_step_name: &str,
    new_step_name: impl Into<String>,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) -> FlowResult<()> {
    let idx = self.locate(existing_step_name)?;
    let name = new_step_name.into();
    self.check_new_name(&name)?;
    self.steps.insert(idx + 1, StepDef::new(name, optional, skip_if));
    Ok(())
  }

  /// Removes a step together with every handler and compensator attached to it.
  pub fn remove_step(&mut self, step_name: &str) -> FlowResult<()> {
    let idx = self.locate(step_name)?;
    self.steps.remove(idx);
    self.before.remove(step_name);
    self.on.remove(step_name);
    self.after.remove(step_name);
    self.compensators.remove(step_name);
    Ok(())
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.locate(step_name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) -> FlowResult<()> {
    let idx = self.locate(step_name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }
}
