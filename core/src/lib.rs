// shopflow/src/lib.rs

//! Shopflow: an async step-pipeline engine for multi-step business operations.
//!
//! A pipeline is an ordered list of named steps. Each step may carry:
//!  - `before`, `on` and `after` handlers that run against a shared `ContextData<T>`,
//!  - a skip condition evaluated against the context,
//!  - compensators that undo the step's side effects if a later step fails.
//!
//! When any handler returns an error, the compensators of every step that had
//! started run newest-first, and then the original error is returned. A handler
//! returning `PipelineControl::Stop` ends the run without compensation.
//!
//! Pipelines are registered in a `FlowRegistry<E>` keyed by their context type,
//! so callers dispatch with nothing more than a context value.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::handler::{Compensator, Handler};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;

/*
    Typical wiring:
    1. Define a context struct `OrderCtx` carrying inputs, intermediate results and outputs.
    2. Build `Pipeline::<OrderCtx, AppError>::new(&[("validate", false, None), ...])`.
    3. Attach handlers with `.on_root("validate", |ctx| Box::pin(async move { ... }))`.
    4. Attach undo actions with `.compensate_root("reserve", |ctx| Box::pin(async move { ... }))`.
    5. Register it: `registry.register_pipeline(pipeline)`.
    6. Run it: `registry.run(ContextData::new(OrderCtx { .. })).await`.
*/
