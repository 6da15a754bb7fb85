// ishop/src/pipelines/mod.rs

//! Multi-step storefront operations, each registered once at startup and run
//! through `AppState::flows`.

use crate::errors::AppError;
use shopflow::FlowRegistry;
use std::sync::Arc;

pub mod common_steps;
pub mod contexts;

pub mod login_pipeline;
pub mod order_lifecycle_pipeline;
pub mod place_order_pipeline;
pub mod register_pipeline;

pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>) {
  tracing::info!("Registering storefront pipelines...");

  register_pipeline::register_register_pipeline(registry);
  login_pipeline::register_login_pipeline(registry);
  place_order_pipeline::register_place_order_pipeline(registry);
  order_lifecycle_pipeline::register_update_status_pipeline(registry);
  order_lifecycle_pipeline::register_cancel_order_pipeline(registry);
  order_lifecycle_pipeline::register_delete_order_pipeline(registry);

  tracing::info!("All storefront pipelines registered.");
}
