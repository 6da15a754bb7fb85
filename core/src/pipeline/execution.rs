// shopflow/src/pipeline/execution.rs

//! `Pipeline::run()`: step iteration, phase dispatch and compensation unwinding.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// On failure, the compensators of each step that had begun executing
  /// (including the failing one) run in reverse step order before the error is
  /// returned. A `Stop` signal ends the run as `PipelineResult::Stopped` and
  /// leaves all side effects in place.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut started: Vec<&str> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(Level::INFO, step_name, "Step skipped by its condition.");
          continue;
        }
      }

      if !self.has_handlers(step_name) {
        if step_def.optional {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, passing over it.");
          continue;
        }
        event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
        self.unwind(&started, &ctx_data).await;
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      started.push(step_name);
      let step_span = info_span!(
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_phases(step_name, &ctx_data).instrument(step_span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, step_name, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) => {
          self.unwind(&started, &ctx_data).await;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  fn has_handlers(&self, step_name: &str) -> bool {
    [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).map_or(false, |v| !v.is_empty()))
  }

  async fn run_phases(&self, step_name: &str, ctx_data: &ContextData<TData>) -> Result<PipelineControl, Err> {
    let phases = [("before", &self.before), ("on", &self.on), ("after", &self.after)];

    for (phase, table) in phases {
      let Some(handlers) = table.get(step_name) else {
        continue;
      };
      for (handler_index, handler_fn) in handlers.iter().enumerate() {
        match handler_fn(ctx_data.clone()).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            event!(Level::DEBUG, phase, handler_index, "Handler requested stop.");
            return Ok(PipelineControl::Stop);
          }
          Err(e) => {
            event!(Level::ERROR, phase, handler_index, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(PipelineControl::Continue)
  }

  /// Runs compensators for `started` steps newest-first. Within a step, the
  /// compensator registered last runs first.
  async fn unwind(&self, started: &[&str], ctx_data: &ContextData<TData>) {
    if started.is_empty() {
      return;
    }
    event!(Level::WARN, steps = started.len(), "Rolling back started steps.");

    for step_name in started.iter().rev() {
      let Some(compensators) = self.compensators.get(*step_name) else {
        continue;
      };
      for compensate in compensators.iter().rev() {
        match compensate(ctx_data.clone()).await {
          Ok(()) => event!(Level::DEBUG, step_name, "Compensation applied."),
          Err(e) => {
            event!(Level::ERROR, step_name, error = %e, "Compensation failed, continuing rollback.")
          }
        }
      }
    }
  }
}
