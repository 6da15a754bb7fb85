// ishop/src/models/carousel.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Carousel {
  pub id: Uuid,
  #[serde(rename = "carouselId")]
  pub code: String,
  pub title: String,
  pub image: String,
  pub created_at: DateTime<Utc>,
}
