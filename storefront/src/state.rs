// ishop/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::{ImageStore, NotificationHub};
use crate::store::Store;
use shopflow::FlowRegistry;
use std::sync::Arc;

/// Shared by every worker; each field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub hub: NotificationHub,
  pub images: Arc<dyn ImageStore>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the shared handles together and registers every pipeline on the new registry.
  pub fn build(config: Arc<AppConfig>, store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    crate::pipelines::register_all_pipelines(&flows);
    AppState {
      store,
      flows,
      hub: NotificationHub::new(),
      images,
      config,
    }
  }
}
