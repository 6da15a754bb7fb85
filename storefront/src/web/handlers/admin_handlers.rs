// ishop/src/web/handlers/admin_handlers.rs

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use actix_web::{web, HttpResponse};
use tracing::instrument;

/// Order count and revenue per calendar month, oldest first.
#[instrument(name = "handler::admin_stats", skip(app_state, _admin))]
pub async fn stats_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.store.monthly_stats().await?))
}

pub async fn health_handler() -> HttpResponse {
  HttpResponse::Ok().body("iShop API is running")
}
