// ishop/src/services/pricing.rs

use crate::errors::{AppError, Result};
use crate::models::{Deal, DealStatus, Product};
use chrono::Utc;

/// Discounted price, rounded half up to whole currency units. Prices too
/// large to scale by a percentage are rejected rather than wrapped.
pub fn final_price(price: i64, discount_percent: i32) -> Result<i64> {
  if price < 0 {
    return Err(AppError::Validation("Price cannot be negative".to_string()));
  }
  validate_discount(discount_percent)?;
  price
    .checked_mul(i64::from(100 - discount_percent))
    .and_then(|scaled| scaled.checked_add(50))
    .map(|scaled| scaled / 100)
    .ok_or_else(|| AppError::Validation("Price is too large".to_string()))
}

pub fn validate_discount(discount: i32) -> Result<()> {
  if !(0..=100).contains(&discount) {
    return Err(AppError::Validation("Discount must be between 0 and 100".to_string()));
  }
  Ok(())
}

/// What one unit of a cart line costs and how it is labelled on the order.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePrice {
  pub unit_price: i64,
  pub original_price: i64,
  pub discount: i32,
  pub title: String,
  pub image: Option<String>,
}

/// Deal lines charge the deal's locked `final_price` and carry its title and
/// image; plain lines charge the live product price.
pub fn price_line(product: &Product, deal: Option<&Deal>) -> LinePrice {
  match deal {
    Some(deal) => LinePrice {
      unit_price: deal.final_price,
      original_price: product.price,
      discount: deal.discount,
      title: deal.title.clone(),
      image: deal.image.clone().or_else(|| product.image.clone()),
    },
    None => LinePrice {
      unit_price: product.price,
      original_price: product.price,
      discount: 0,
      title: product.name.clone(),
      image: product.image.clone(),
    },
  }
}

/// Copies price, stock and labels from `product` into `deal` and re-derives
/// the final price. Used when a deal is (re)linked and on explicit recompute.
pub fn refresh_from_product(deal: &mut Deal, product: &Product) -> Result<()> {
  deal.product_id = Some(product.id);
  deal.title = product.name.clone();
  deal.price = product.price;
  deal.stock = product.stock;
  deal.category = product.category.clone();
  if product.image.is_some() {
    deal.image = product.image.clone();
  }
  deal.final_price = final_price(deal.price, deal.discount)?;
  deal.updated_at = Utc::now();
  Ok(())
}

pub fn status_or_window(status: Option<DealStatus>, deal: &Deal) -> DealStatus {
  status.unwrap_or_else(|| DealStatus::for_window(deal.start_date, deal.end_date, Utc::now()))
}
