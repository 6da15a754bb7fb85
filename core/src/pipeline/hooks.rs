// shopflow/src/pipeline/hooks.rs

//! Registration of `before` / `on` / `after` handlers and step compensators.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::core::handler::{Compensator, Handler};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, Level};

fn wrap_handler<TData, Err, F, UserErr>(
  handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: 'static,
  F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |ctx_data| {
    let user_fut = handler_fn(ctx_data);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn push_handler(
    table: &mut HashMap<String, Vec<Handler<TData, Err>>>,
    step_name: &str,
    handler: Handler<TData, Err>,
  ) {
    table.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Adds a handler that runs before the step's `on` handlers.
  ///
  /// The handler may return any error convertible into the pipeline's `Err`.
  pub fn before_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.assert_step_exists(step_name);
    Self::push_handler(&mut self.before, step_name, wrap_handler(handler_fn));
  }

  /// Adds a main handler for the step.
  pub fn on_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.assert_step_exists(step_name);
    Self::push_handler(&mut self.on, step_name, wrap_handler(handler_fn));
  }

  pub fn after_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.assert_step_exists(step_name);
    Self::push_handler(&mut self.after, step_name, wrap_handler(handler_fn));
  }

  /// Attaches an undo action to a step.
  ///
  /// It runs only if the step started and the run later fails. A step that
  /// reserves resources should record what it reserved in the context as it
  /// goes, so the compensator can release exactly that even when the step
  /// itself fails halfway through.
  pub fn compensate_root<F, UserErr>(
    &mut self,
    step_name: &str,
    compensate_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.assert_step_exists(step_name);
    let compensator: Compensator<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = compensate_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self
      .compensators
      .entry(step_name.to_string())
      .or_default()
      .push(compensator);
    event!(Level::DEBUG, %step_name, "Compensator registered.");
  }
}
