// ishop/src/web/handlers/deal_handlers.rs

use crate::errors::AppError;
use crate::models::{Deal, DealStatus, DealView, Product};
use crate::services::{ids, pricing};
use crate::state::AppState;
use crate::store::Store;
use crate::web::extractors::AdminUser;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shared by create and update. On update, absent fields keep their value.
/// Any client-sent `finalPrice` is ignored; it is always derived.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DealPayload {
  pub product_id: Option<Uuid>,
  pub title: Option<String>,
  pub category: Option<String>,
  pub price: Option<i64>,
  pub discount: Option<i32>,
  pub stock: Option<i32>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date: Option<DateTime<Utc>>,
  pub status: Option<DealStatus>,
  pub image: Option<String>,
}

fn deal_not_found() -> AppError {
  AppError::NotFound("Deal not found".to_string())
}

async fn linked_product(store: &dyn Store, product_id: Uuid) -> Result<Product, AppError> {
  store
    .get_product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

fn validate_deal(deal: &Deal) -> Result<(), AppError> {
  if deal.title.trim().is_empty() {
    return Err(AppError::Validation("Deal title is required".to_string()));
  }
  if deal.price < 0 || deal.stock < 0 {
    return Err(AppError::Validation("Price and stock cannot be negative".to_string()));
  }
  if deal.end_date < deal.start_date {
    return Err(AppError::Validation("End date must be after start date".to_string()));
  }
  pricing::validate_discount(deal.discount)
}

#[instrument(name = "handler::list_deals", skip(app_state))]
pub async fn list_deals_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let deals = app_state.store.list_deals().await?;
  let mut products: HashMap<Uuid, Option<Product>> = HashMap::new();
  let mut views = Vec::with_capacity(deals.len());
  for deal in deals {
    let product = match deal.product_id {
      Some(id) => {
        if !products.contains_key(&id) {
          products.insert(id, app_state.store.get_product(id).await?);
        }
        products.get(&id).cloned().flatten()
      }
      None => None,
    };
    views.push(DealView { deal, product });
  }
  Ok(HttpResponse::Ok().json(views))
}

#[instrument(name = "handler::get_deal", skip(app_state))]
pub async fn get_deal_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let deal = app_state
    .store
    .find_deal_by_code(&path.into_inner())
    .await?
    .ok_or_else(deal_not_found)?;
  let product = match deal.product_id {
    Some(id) => app_state.store.get_product(id).await?,
    None => None,
  };
  Ok(HttpResponse::Ok().json(DealView { deal, product }))
}

#[instrument(name = "handler::create_deal", skip(app_state, _admin, req_payload))]
pub async fn create_deal_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req_payload: web::Json<DealPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let (start_date, end_date) = match (payload.start_date, payload.end_date) {
    (Some(start), Some(end)) => (start, end),
    _ => return Err(AppError::Validation("Start and end dates are required".to_string())),
  };

  let now = Utc::now();
  let discount = payload.discount.unwrap_or(0);
  let price = payload.price.unwrap_or(0);
  let mut deal = Deal {
    id: Uuid::new_v4(),
    code: String::new(),
    product_id: None,
    category: payload.category.unwrap_or_default(),
    title: payload.title.unwrap_or_default(),
    price,
    discount,
    final_price: 0,
    stock: payload.stock.unwrap_or(0),
    start_date,
    end_date,
    status: DealStatus::Active,
    image: payload.image.filter(|url| !url.is_empty()),
    created_at: now,
    updated_at: now,
  };
  if let Some(product_id) = payload.product_id {
    let product = linked_product(app_state.store.as_ref(), product_id).await?;
    pricing::refresh_from_product(&mut deal, &product)?;
  }
  deal.status = pricing::status_or_window(payload.status, &deal);
  validate_deal(&deal)?;
  deal.final_price = pricing::final_price(deal.price, deal.discount)?;

  deal.code = ids::DEAL.allocate(app_state.store.as_ref()).await?;
  app_state.store.insert_deal(&deal).await?;
  info!(code = %deal.code, final_price = deal.final_price, "Deal created.");
  Ok(HttpResponse::Created().json(deal))
}

#[instrument(name = "handler::update_deal", skip(app_state, _admin, req_payload))]
pub async fn update_deal_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<DealPayload>,
) -> Result<HttpResponse, AppError> {
  let mut deal = app_state
    .store
    .get_deal(path.into_inner())
    .await?
    .ok_or_else(deal_not_found)?;
  let patch = req_payload.into_inner();

  if let Some(title) = patch.title {
    deal.title = title;
  }
  if let Some(category) = patch.category {
    deal.category = category;
  }
  if let Some(price) = patch.price {
    deal.price = price;
  }
  if let Some(discount) = patch.discount {
    deal.discount = discount;
  }
  if let Some(stock) = patch.stock {
    deal.stock = stock;
  }
  if let Some(start) = patch.start_date {
    deal.start_date = start;
  }
  if let Some(end) = patch.end_date {
    deal.end_date = end;
  }
  if let Some(image) = patch.image.filter(|url| !url.is_empty()) {
    deal.image = Some(image);
  }
  // Re-selecting a product is the only implicit way the locked price moves.
  if let Some(product_id) = patch.product_id {
    let product = linked_product(app_state.store.as_ref(), product_id).await?;
    pricing::refresh_from_product(&mut deal, &product)?;
  }
  if let Some(status) = patch.status {
    deal.status = status;
  }
  validate_deal(&deal)?;
  deal.final_price = pricing::final_price(deal.price, deal.discount)?;
  deal.updated_at = Utc::now();

  if !app_state.store.update_deal(&deal).await? {
    return Err(deal_not_found());
  }
  Ok(HttpResponse::Ok().json(deal))
}

/// Pulls the linked product's current price and stock into the deal.
#[instrument(name = "handler::recompute_deal", skip(app_state, _admin))]
pub async fn recompute_deal_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let mut deal = app_state
    .store
    .get_deal(path.into_inner())
    .await?
    .ok_or_else(deal_not_found)?;
  let product_id = deal
    .product_id
    .ok_or_else(|| AppError::Validation("Deal is not linked to a product".to_string()))?;
  let product = linked_product(app_state.store.as_ref(), product_id).await?;

  pricing::refresh_from_product(&mut deal, &product)?;
  if !app_state.store.update_deal(&deal).await? {
    return Err(deal_not_found());
  }
  info!(code = %deal.code, price = deal.price, final_price = deal.final_price, "Deal recomputed.");
  Ok(HttpResponse::Ok().json(deal))
}

#[instrument(name = "handler::delete_deal", skip(app_state, _admin))]
pub async fn delete_deal_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_deal(path.into_inner()).await? {
    return Err(deal_not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Deal deleted" })))
}
