// shopflow/src/core/handler.rs

//! Boxed async callbacks stored by a pipeline.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A step handler.
///
/// It receives a clone of the shared context handle and resolves to a flow
/// signal or the pipeline's error. Lock guards taken on the context must be
/// released before the handler awaits anything.
pub type Handler<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<PipelineControl, Err>> + Send + Sync>;

/// An undo action for a step, run when a later step (or the step itself) fails.
///
/// Compensators read what the step recorded in the context and reverse it.
/// Their own failures are logged by the engine and never replace the error
/// that triggered the rollback.
pub type Compensator<TData, Err> = Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<(), Err>> + Send + Sync>;
