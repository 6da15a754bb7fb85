// ishop/src/models/deal.rs

use super::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "deal_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
  Active,
  Upcoming,
  Expired,
}

impl DealStatus {
  /// Status implied by the validity window at `now`.
  pub fn for_window(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
    if now < start {
      DealStatus::Upcoming
    } else if now > end {
      DealStatus::Expired
    } else {
      DealStatus::Active
    }
  }
}

/// A time-boxed price override. `price` and `final_price` are locked when the
/// deal is saved; they only follow the product again on an explicit recompute
/// or when the product is re-selected.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
  pub id: Uuid,
  #[serde(rename = "dealId")]
  pub code: String,
  pub product_id: Option<Uuid>,
  pub category: String,
  pub title: String,
  pub price: i64,
  pub discount: i32,
  pub final_price: i64,
  pub stock: i32,
  pub start_date: DateTime<Utc>,
  pub end_date: DateTime<Utc>,
  pub status: DealStatus,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A deal with its linked product inlined, as returned by single-deal lookups.
#[derive(Debug, Clone, Serialize)]
pub struct DealView {
  #[serde(flatten)]
  pub deal: Deal,
  pub product: Option<Product>,
}
