// ishop/src/web/handlers/carousel_handlers.rs

use crate::errors::AppError;
use crate::models::Carousel;
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
pub struct CarouselPayload {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub image: Option<String>,
}

fn carousel_not_found() -> AppError {
  AppError::NotFound("Carousel not found".to_string())
}

#[instrument(name = "handler::list_carousels", skip(app_state))]
pub async fn list_carousels_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.store.list_carousels().await?))
}

#[instrument(name = "handler::create_carousel", skip(app_state, _admin, req_payload))]
pub async fn create_carousel_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req_payload: web::Json<CarouselPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let image = payload
    .image
    .filter(|url| !url.trim().is_empty())
    .ok_or_else(|| AppError::Validation("No image uploaded".to_string()))?;

  let code = ids::CAROUSEL.allocate(app_state.store.as_ref()).await?;
  let slide = Carousel {
    id: Uuid::new_v4(),
    code,
    title: payload.title.trim().to_string(),
    image,
    created_at: Utc::now(),
  };
  app_state.store.insert_carousel(&slide).await?;
  info!(code = %slide.code, "Carousel slide created.");
  Ok(HttpResponse::Created().json(slide))
}

#[instrument(name = "handler::update_carousel", skip(app_state, _admin, req_payload))]
pub async fn update_carousel_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<CarouselPayload>,
) -> Result<HttpResponse, AppError> {
  let mut slide = app_state
    .store
    .get_carousel(path.into_inner())
    .await?
    .ok_or_else(carousel_not_found)?;
  let payload = req_payload.into_inner();

  slide.title = payload.title.trim().to_string();
  if let Some(image) = payload.image.filter(|url| !url.trim().is_empty()) {
    slide.image = image;
  }
  if !app_state.store.update_carousel(&slide).await? {
    return Err(carousel_not_found());
  }
  Ok(HttpResponse::Ok().json(slide))
}

#[instrument(name = "handler::delete_carousel", skip(app_state, _admin))]
pub async fn delete_carousel_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_carousel(path.into_inner()).await? {
    return Err(carousel_not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Carousel deleted successfully" })))
}
