// ishop/src/web/handlers/product_handlers.rs

use crate::errors::AppError;
use crate::models::product::DEFAULT_RATING;
use crate::models::{Product, Specification};
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
pub struct ProductQuery {
  pub category: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
  pub name: String,
  pub price: i64,
  pub category: String,
  #[serde(default)]
  pub stock: i32,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub rating: Option<f32>,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub about_items: Vec<String>,
  #[serde(default)]
  pub specifications: Vec<Specification>,
}

/// Partial update: absent fields keep their stored value.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
  pub name: Option<String>,
  pub price: Option<i64>,
  pub category: Option<String>,
  pub stock: Option<i32>,
  pub image: Option<String>,
  pub rating: Option<f32>,
  pub description: Option<String>,
  pub about_items: Option<Vec<String>>,
  pub specifications: Option<Vec<Specification>>,
}

fn validate_amounts(price: i64, stock: i32) -> Result<(), AppError> {
  if price < 0 {
    return Err(AppError::Validation("Price cannot be negative".to_string()));
  }
  if stock < 0 {
    return Err(AppError::Validation("Stock cannot be negative".to_string()));
  }
  Ok(())
}

fn product_not_found() -> AppError {
  AppError::NotFound("Product not found".to_string())
}

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductQuery>,
) -> Result<HttpResponse, AppError> {
  let category = query.category.as_deref().filter(|c| !c.is_empty());
  let products = app_state.store.list_products(category).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::products_by_category", skip(app_state))]
pub async fn products_by_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.store.list_products(Some(path.as_str())).await?;
  if products.is_empty() {
    return Err(AppError::NotFound("No products found in this category".to_string()));
  }
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .store
    .get_product(path.into_inner())
    .await?
    .ok_or_else(product_not_found)?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::create_product", skip(app_state, _admin, req_payload), fields(name = %req_payload.name))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  req_payload: web::Json<CreateProductPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  if payload.name.trim().is_empty() || payload.category.trim().is_empty() {
    return Err(AppError::Validation("Name and category are required".to_string()));
  }
  validate_amounts(payload.price, payload.stock)?;

  let code = ids::PRODUCT.allocate(app_state.store.as_ref()).await?;
  let now = Utc::now();
  let product = Product {
    id: Uuid::new_v4(),
    code,
    name: payload.name.trim().to_string(),
    price: payload.price,
    category: payload.category.trim().to_string(),
    stock: payload.stock,
    image: payload.image,
    rating: payload.rating.unwrap_or(DEFAULT_RATING),
    description: payload.description,
    about_items: payload.about_items,
    specifications: payload.specifications,
    created_at: now,
    updated_at: now,
  };
  app_state.store.insert_product(&product).await?;
  info!(product_id = %product.id, code = %product.code, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::update_product", skip(app_state, _admin, req_payload))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateProductPayload>,
) -> Result<HttpResponse, AppError> {
  let mut product = app_state
    .store
    .get_product(path.into_inner())
    .await?
    .ok_or_else(product_not_found)?;
  let patch = req_payload.into_inner();

  if let Some(name) = patch.name {
    product.name = name;
  }
  if let Some(price) = patch.price {
    product.price = price;
  }
  if let Some(category) = patch.category {
    product.category = category;
  }
  if let Some(stock) = patch.stock {
    product.stock = stock;
  }
  if patch.image.is_some() {
    product.image = patch.image;
  }
  if let Some(rating) = patch.rating {
    product.rating = rating;
  }
  if let Some(description) = patch.description {
    product.description = description;
  }
  if let Some(about_items) = patch.about_items {
    product.about_items = about_items;
  }
  if let Some(specifications) = patch.specifications {
    product.specifications = specifications;
  }
  validate_amounts(product.price, product.stock)?;
  product.updated_at = Utc::now();

  if !app_state.store.update_product(&product).await? {
    return Err(product_not_found());
  }
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, _admin))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_product(path.into_inner()).await? {
    return Err(product_not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
}
