// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use ishop::config::AppConfig;
use ishop::errors::{AppError, Result};
use ishop::models::{Carousel, Category, Deal, DealStatus, Order, Product, Role, ShippingAddress, User};
use ishop::services::{auth_service, pricing, LocalImageStore};
use ishop::state::AppState;
use ishop::store::{CodeKind, MemoryStore, MonthlyStats, Store};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "secret123";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Fresh in-memory storefront with every pipeline registered.
pub fn memory_state() -> AppState {
  state_with_store(Arc::new(MemoryStore::new()))
}

pub fn state_with_store(store: Arc<dyn Store>) -> AppState {
  let config = Arc::new(AppConfig::for_memory(TEST_SECRET));
  let images = Arc::new(LocalImageStore::new(
    config.upload_dir.clone(),
    config.public_base_url.clone(),
  ));
  AppState::build(config, store, images)
}

/// In-memory store whose order inserts always fail, for exercising rollback
/// of the steps that ran before `persist_order`.
#[derive(Default)]
pub struct OrderInsertFailingStore {
  inner: MemoryStore,
}

#[async_trait]
impl Store for OrderInsertFailingStore {
  async fn code_taken(&self, kind: CodeKind, code: &str) -> Result<bool> {
    self.inner.code_taken(kind, code).await
  }
  async fn next_sequence(&self, name: &str) -> Result<i64> {
    self.inner.next_sequence(name).await
  }

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
    self.inner.list_products(category).await
  }
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    self.inner.get_product(id).await
  }
  async fn insert_product(&self, product: &Product) -> Result<()> {
    self.inner.insert_product(product).await
  }
  async fn update_product(&self, product: &Product) -> Result<bool> {
    self.inner.update_product(product).await
  }
  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_product(id).await
  }
  async fn try_decrement_stock(&self, id: Uuid, quantity: i32) -> Result<Option<i32>> {
    self.inner.try_decrement_stock(id, quantity).await
  }
  async fn restock(&self, id: Uuid, quantity: i32) -> Result<()> {
    self.inner.restock(id, quantity).await
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    self.inner.list_categories().await
  }
  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    self.inner.get_category(id).await
  }
  async fn insert_category(&self, category: &Category) -> Result<()> {
    self.inner.insert_category(category).await
  }
  async fn update_category(&self, category: &Category) -> Result<bool> {
    self.inner.update_category(category).await
  }
  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_category(id).await
  }

  async fn list_carousels(&self) -> Result<Vec<Carousel>> {
    self.inner.list_carousels().await
  }
  async fn get_carousel(&self, id: Uuid) -> Result<Option<Carousel>> {
    self.inner.get_carousel(id).await
  }
  async fn insert_carousel(&self, carousel: &Carousel) -> Result<()> {
    self.inner.insert_carousel(carousel).await
  }
  async fn update_carousel(&self, carousel: &Carousel) -> Result<bool> {
    self.inner.update_carousel(carousel).await
  }
  async fn delete_carousel(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_carousel(id).await
  }

  async fn list_deals(&self) -> Result<Vec<Deal>> {
    self.inner.list_deals().await
  }
  async fn get_deal(&self, id: Uuid) -> Result<Option<Deal>> {
    self.inner.get_deal(id).await
  }
  async fn find_deal_by_code(&self, code: &str) -> Result<Option<Deal>> {
    self.inner.find_deal_by_code(code).await
  }
  async fn insert_deal(&self, deal: &Deal) -> Result<()> {
    self.inner.insert_deal(deal).await
  }
  async fn update_deal(&self, deal: &Deal) -> Result<bool> {
    self.inner.update_deal(deal).await
  }
  async fn delete_deal(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_deal(id).await
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    self.inner.list_users().await
  }
  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.inner.get_user(id).await
  }
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    self.inner.find_user_by_email(email).await
  }
  async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
    self.inner.find_user_by_mobile(mobile).await
  }
  async fn insert_user(&self, user: &User) -> Result<()> {
    self.inner.insert_user(user).await
  }
  async fn update_user(&self, user: &User) -> Result<bool> {
    self.inner.update_user(user).await
  }
  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_user(id).await
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    self.inner.list_orders().await
  }
  async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>> {
    self.inner.orders_for_email(email).await
  }
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    self.inner.get_order(id).await
  }
  async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>> {
    self.inner.find_order_by_code(code).await
  }
  async fn insert_order(&self, _order: &Order) -> Result<()> {
    Err(AppError::Internal("orders table unavailable".to_string()))
  }
  async fn update_order(&self, order: &Order) -> Result<bool> {
    self.inner.update_order(order).await
  }
  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    self.inner.delete_order(id).await
  }
  async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>> {
    self.inner.monthly_stats().await
  }
}

pub async fn insert_user(state: &AppState, email: &str, mobile: &str, role: Role) -> User {
  let now = Utc::now();
  let user = User {
    id: Uuid::new_v4(),
    code: format!("USR-{}", &mobile[mobile.len() - 4..]),
    name: "Test Shopper".to_string(),
    email: email.to_string(),
    mobile: mobile.to_string(),
    password_hash: auth_service::hash_password(TEST_PASSWORD).unwrap(),
    role,
    addresses: Vec::new(),
    created_at: now,
    updated_at: now,
  };
  state.store.insert_user(&user).await.unwrap();
  user
}

pub fn token_for(user: &User) -> String {
  auth_service::issue_token(user.id, user.role, TEST_SECRET, 1).unwrap()
}

pub async fn insert_product(state: &AppState, name: &str, price: i64, stock: i32) -> Product {
  let now = Utc::now();
  let product = Product {
    id: Uuid::new_v4(),
    code: format!("P{}", &Uuid::new_v4().simple().to_string()[..6]),
    name: name.to_string(),
    price,
    category: "Electronics".to_string(),
    stock,
    image: Some(format!("http://localhost/uploads/{}.png", name)),
    rating: 4.0,
    description: String::new(),
    about_items: Vec::new(),
    specifications: Vec::new(),
    created_at: now,
    updated_at: now,
  };
  state.store.insert_product(&product).await.unwrap();
  product
}

/// An active deal on `product`, priced from it at insertion time.
pub async fn insert_deal(state: &AppState, code: &str, product: &Product, discount: i32) -> Deal {
  let now = Utc::now();
  let deal = Deal {
    id: Uuid::new_v4(),
    code: code.to_string(),
    product_id: Some(product.id),
    category: product.category.clone(),
    title: format!("{} deal", product.name),
    price: product.price,
    discount,
    final_price: pricing::final_price(product.price, discount).unwrap(),
    stock: product.stock,
    start_date: now - Duration::days(1),
    end_date: now + Duration::days(1),
    status: DealStatus::Active,
    image: None,
    created_at: now,
    updated_at: now,
  };
  state.store.insert_deal(&deal).await.unwrap();
  deal
}

pub fn shipping_address() -> ShippingAddress {
  ShippingAddress {
    name: "Asha Rao".to_string(),
    phone: "9876543210".to_string(),
    address: "12 MG Road".to_string(),
    city: "Bengaluru".to_string(),
    state: "Karnataka".to_string(),
    pincode: "560001".to_string(),
  }
}
