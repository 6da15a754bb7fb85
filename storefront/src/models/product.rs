// ishop/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_RATING: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
  pub key: String,
  pub value: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  #[serde(rename = "productId")]
  pub code: String,
  pub name: String,
  /// Whole currency units.
  pub price: i64,
  pub category: String,
  pub stock: i32,
  pub image: Option<String>,
  pub rating: f32,
  pub description: String,
  #[sqlx(json)]
  pub about_items: Vec<String>,
  #[sqlx(json)]
  pub specifications: Vec<Specification>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
