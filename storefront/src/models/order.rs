// ishop/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum")]
pub enum OrderStatus {
  Pending,
  Ordered,
  Confirmed,
  Processing,
  Shipped,
  #[serde(rename = "Out for Delivery")]
  #[sqlx(rename = "Out for Delivery")]
  OutForDelivery,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 8] = [
    OrderStatus::Pending,
    OrderStatus::Ordered,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Ordered => "Ordered",
      OrderStatus::Confirmed => "Confirmed",
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipped => "Shipped",
      OrderStatus::OutForDelivery => "Out for Delivery",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
    }
  }

  /// Orders an admin may still delete outright.
  pub fn is_deletable(&self) -> bool {
    matches!(self, OrderStatus::Pending | OrderStatus::Ordered)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OrderStatus::ALL
      .iter()
      .copied()
      .find(|status| status.as_str() == s.trim())
      .ok_or_else(|| format!("Unknown order status '{}'", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "cancelled_by_enum")]
pub enum CancelledBy {
  User,
  Admin,
}

/// Shipping address as captured at checkout. Copied into the order, never referenced.
///
/// Missing fields deserialize as empty so completeness is reported by order
/// validation rather than by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
  pub name: String,
  #[serde(deserialize_with = "string_or_number")]
  pub phone: String,
  pub address: String,
  pub city: String,
  pub state: String,
  #[serde(deserialize_with = "string_or_number")]
  pub pincode: String,
}

/// Accepts `"560001"`, `560001` or `null` for digit fields clients often send as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Raw {
    Text(String),
    Number(u64),
  }

  Ok(match Option::<Raw>::deserialize(deserializer)? {
    Some(Raw::Text(text)) => text,
    Some(Raw::Number(n)) => n.to_string(),
    None => String::new(),
  })
}

impl ShippingAddress {
  pub fn is_complete(&self) -> bool {
    [&self.name, &self.phone, &self.address, &self.city, &self.state, &self.pincode]
      .iter()
      .all(|field| !field.trim().is_empty())
  }
}

/// One purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: Uuid,
  pub deal_id: Option<String>,
  pub product_name: String,
  pub product_image: Option<String>,
  pub product_category: String,
  /// Unit price actually charged.
  pub price: i64,
  pub original_price: i64,
  pub discount: i32,
  pub quantity: i32,
  pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  #[serde(rename = "orderId")]
  pub code: String,
  pub user_id: Uuid,
  pub user_email: String,
  #[sqlx(json)]
  pub cart_items: Vec<OrderLine>,
  #[sqlx(json)]
  pub shipping_address: ShippingAddress,
  pub payment_method: String,
  pub payment_status: Option<String>,
  pub status: OrderStatus,
  pub cancelled_by: Option<CancelledBy>,
  pub total_amount: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn lines_total(&self) -> i64 {
    self.cart_items.iter().map(|line| line.total_amount).sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn partial_shipping_address_deserializes_as_incomplete() {
    let address: ShippingAddress = serde_json::from_value(json!({ "name": "A" })).unwrap();
    assert_eq!(address.name, "A");
    assert!(address.pincode.is_empty());
    assert!(!address.is_complete());
  }

  #[test]
  fn numeric_pincode_and_phone_are_kept_as_text() {
    let address: ShippingAddress = serde_json::from_value(json!({
      "name": "Asha",
      "phone": 9876543210u64,
      "address": "12 MG Road",
      "city": "Bengaluru",
      "state": "Karnataka",
      "pincode": 560001,
    }))
    .unwrap();
    assert_eq!(address.pincode, "560001");
    assert_eq!(address.phone, "9876543210");
    assert!(address.is_complete());
  }
}
