// ishop/src/web/handlers/upload_handlers.rs

use crate::errors::AppError;
use crate::services::image_store::MAX_IMAGE_BYTES;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde_json::json;
use tracing::{info, instrument, warn};

const IMAGE_FIELD: &str = "image";

fn malformed(e: impl std::fmt::Display) -> AppError {
  warn!(error = %e, "Malformed multipart upload.");
  AppError::Validation("Invalid multipart payload".to_string())
}

/// Pulls the `image` part out of a multipart body, refusing anything over the size cap.
async fn read_image_field(mut payload: Multipart) -> Result<Option<(String, Vec<u8>)>, AppError> {
  while let Some(item) = payload.next().await {
    let mut field = item.map_err(malformed)?;
    let disposition = field.content_disposition();
    if disposition.get_name() != Some(IMAGE_FIELD) {
      continue;
    }
    let file_name = disposition.get_filename().unwrap_or_default().to_string();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
      let chunk = chunk.map_err(malformed)?;
      if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation("Image exceeds the 5 MB limit".to_string()));
      }
      bytes.extend_from_slice(&chunk);
    }
    if bytes.is_empty() {
      return Ok(None);
    }
    return Ok(Some((file_name, bytes)));
  }
  Ok(None)
}

#[instrument(name = "handler::upload_image", skip_all)]
pub async fn upload_image_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: Multipart,
) -> Result<HttpResponse, AppError> {
  let (file_name, bytes) = read_image_field(payload)
    .await?
    .ok_or_else(|| AppError::Validation("No image uploaded".to_string()))?;

  let image_url = app_state.images.save(&file_name, bytes).await?;
  info!(%image_url, "Image uploaded.");
  Ok(HttpResponse::Ok().json(json!({ "imageUrl": image_url })))
}
