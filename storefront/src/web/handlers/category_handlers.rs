// ishop/src/web/handlers/category_handlers.rs

use crate::errors::AppError;
use crate::models::Category;
use crate::services::ids;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct CategoryPayload {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub image: Option<String>,
}

fn category_not_found() -> AppError {
  AppError::NotFound("Category not found".to_string())
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.store.list_categories().await?))
}

#[instrument(name = "handler::create_category", skip(app_state, _admin, req_payload))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req_payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let name = payload.name.trim();
  if name.is_empty() {
    return Err(AppError::Validation("Category name is required".to_string()));
  }

  let code = ids::CATEGORY.allocate(app_state.store.as_ref()).await?;
  let category = Category {
    id: Uuid::new_v4(),
    code,
    name: name.to_string(),
    image: payload.image.filter(|url| !url.is_empty()),
    created_at: Utc::now(),
  };
  app_state.store.insert_category(&category).await?;
  info!(code = %category.code, "Category created.");
  Ok(HttpResponse::Created().json(category))
}

#[instrument(name = "handler::update_category", skip(app_state, _admin, req_payload))]
pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<CategoryPayload>,
) -> Result<HttpResponse, AppError> {
  let mut category = app_state
    .store
    .get_category(path.into_inner())
    .await?
    .ok_or_else(category_not_found)?;
  let payload = req_payload.into_inner();

  if !payload.name.trim().is_empty() {
    category.name = payload.name.trim().to_string();
  }
  if let Some(image) = payload.image.filter(|url| !url.is_empty()) {
    category.image = Some(image);
  }
  if !app_state.store.update_category(&category).await? {
    return Err(category_not_found());
  }
  Ok(HttpResponse::Ok().json(category))
}

#[instrument(name = "handler::delete_category", skip(app_state, _admin))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_category(path.into_inner()).await? {
    return Err(category_not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Category deleted" })))
}
