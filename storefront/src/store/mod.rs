// ishop/src/store/mod.rs

//! Persistence seam. Handlers and pipelines only see `dyn Store`; the backend
//! is picked from configuration at startup.

pub mod memory;
pub mod postgres;

use crate::errors::{AppError, Result};
use crate::models::{Carousel, Category, Deal, Order, Product, User};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Raised by both backends when a user write collides on email or mobile.
pub(crate) fn duplicate_user() -> AppError {
  AppError::Validation("User with email or mobile already exists".to_string())
}

/// Which table a human-readable code lives in, for uniqueness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
  Product,
  Category,
  Carousel,
  Deal,
  User,
  Order,
}

/// One calendar month of order activity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
  /// `YYYY-MM`
  pub month: String,
  pub total_orders: i64,
  pub total_revenue: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
  // --- identifiers ---

  async fn code_taken(&self, kind: CodeKind, code: &str) -> Result<bool>;

  /// Atomically increments the named counter and returns the new value (first call yields 1).
  async fn next_sequence(&self, name: &str) -> Result<i64>;

  // --- products ---

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>>;
  async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn insert_product(&self, product: &Product) -> Result<()>;
  async fn update_product(&self, product: &Product) -> Result<bool>;
  async fn delete_product(&self, id: Uuid) -> Result<bool>;

  /// Takes `quantity` units if at least that many remain and returns the new
  /// stock. `None` means the product is missing or short; nothing changed.
  async fn try_decrement_stock(&self, id: Uuid, quantity: i32) -> Result<Option<i32>>;

  /// Puts back units taken by `try_decrement_stock`.
  async fn restock(&self, id: Uuid, quantity: i32) -> Result<()>;

  // --- categories ---

  async fn list_categories(&self) -> Result<Vec<Category>>;
  async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;
  async fn insert_category(&self, category: &Category) -> Result<()>;
  async fn update_category(&self, category: &Category) -> Result<bool>;
  async fn delete_category(&self, id: Uuid) -> Result<bool>;

  // --- carousels ---

  async fn list_carousels(&self) -> Result<Vec<Carousel>>;
  async fn get_carousel(&self, id: Uuid) -> Result<Option<Carousel>>;
  async fn insert_carousel(&self, carousel: &Carousel) -> Result<()>;
  async fn update_carousel(&self, carousel: &Carousel) -> Result<bool>;
  async fn delete_carousel(&self, id: Uuid) -> Result<bool>;

  // --- deals ---

  async fn list_deals(&self) -> Result<Vec<Deal>>;
  async fn get_deal(&self, id: Uuid) -> Result<Option<Deal>>;
  async fn find_deal_by_code(&self, code: &str) -> Result<Option<Deal>>;
  async fn insert_deal(&self, deal: &Deal) -> Result<()>;
  async fn update_deal(&self, deal: &Deal) -> Result<bool>;
  async fn delete_deal(&self, id: Uuid) -> Result<bool>;

  // --- users ---

  async fn list_users(&self) -> Result<Vec<User>>;
  async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>>;
  async fn insert_user(&self, user: &User) -> Result<()>;
  async fn update_user(&self, user: &User) -> Result<bool>;
  async fn delete_user(&self, id: Uuid) -> Result<bool>;

  // --- orders ---

  /// Newest first.
  async fn list_orders(&self) -> Result<Vec<Order>>;
  /// Orders placed under `email`, newest first.
  async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>>;
  async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
  async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>>;
  async fn insert_order(&self, order: &Order) -> Result<()>;
  async fn update_order(&self, order: &Order) -> Result<bool>;
  async fn delete_order(&self, id: Uuid) -> Result<bool>;
  async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>>;
}
