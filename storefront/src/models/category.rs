// ishop/src/models/category.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: Uuid,
  #[serde(rename = "categoryId")]
  pub code: String,
  pub name: String,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
}
