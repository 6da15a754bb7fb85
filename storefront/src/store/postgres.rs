// ishop/src/store/postgres.rs

//! Postgres-backed store using runtime-checked `sqlx` queries.

use super::{CodeKind, MonthlyStats, Store};
use crate::errors::{AppError, Result};
use crate::models::{Carousel, Category, Deal, Order, Product, User};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
  "id, code, name, price, category, stock, image, rating, description, about_items, specifications, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, code, name, image, created_at";
const CAROUSEL_COLUMNS: &str = "id, code, title, image, created_at";
const DEAL_COLUMNS: &str = "id, code, product_id, category, title, price, discount, final_price, stock, start_date, end_date, status, image, created_at, updated_at";
const USER_COLUMNS: &str = "id, code, name, email, mobile, password_hash, role, addresses, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, code, user_id, user_email, cart_items, shipping_address, payment_method, payment_status, status, cancelled_by, total_amount, created_at, updated_at";

/// Unique-index hits on `users` surface as the same validation error the
/// registration check produces.
fn user_write_error(err: sqlx::Error) -> AppError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => super::duplicate_user(),
    _ => AppError::Sqlx(err),
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Connects and brings the schema up to date.
  #[instrument(name = "PgStore::connect", skip(database_url))]
  pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!("Successfully connected to the database.");
    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    info!("Database migrations applied.");
    Ok(Self::new(pool))
  }
}

fn table_for(kind: CodeKind) -> &'static str {
  match kind {
    CodeKind::Product => "products",
    CodeKind::Category => "categories",
    CodeKind::Carousel => "carousels",
    CodeKind::Deal => "deals",
    CodeKind::User => "users",
    CodeKind::Order => "orders",
  }
}

#[async_trait]
impl Store for PgStore {
  async fn code_taken(&self, kind: CodeKind, code: &str) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE code = $1)", table_for(kind));
    let taken = sqlx::query_scalar::<_, bool>(&sql).bind(code).fetch_one(&self.pool).await?;
    Ok(taken)
  }

  async fn next_sequence(&self, name: &str) -> Result<i64> {
    // Single upsert: concurrent callers serialize on the row lock.
    let value = sqlx::query_scalar::<_, i64>(
      "INSERT INTO sequences (name, value) VALUES ($1, 1)
       ON CONFLICT (name) DO UPDATE SET value = sequences.value + 1
       RETURNING value",
    )
    .bind(name)
    .fetch_one(&self.pool)
    .await?;
    Ok(value)
  }

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
    let sql = format!(
      "SELECT {} FROM products WHERE ($1::TEXT IS NULL OR category = $1) ORDER BY created_at DESC",
      PRODUCT_COLUMNS
    );
    Ok(sqlx::query_as::<_, Product>(&sql).bind(category).fetch_all(&self.pool).await?)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn insert_product(&self, p: &Product) -> Result<()> {
    sqlx::query(
      "INSERT INTO products (id, code, name, price, category, stock, image, rating, description, about_items, specifications, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(p.id)
    .bind(&p.code)
    .bind(&p.name)
    .bind(p.price)
    .bind(&p.category)
    .bind(p.stock)
    .bind(&p.image)
    .bind(p.rating)
    .bind(&p.description)
    .bind(Json(&p.about_items))
    .bind(Json(&p.specifications))
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_product(&self, p: &Product) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE products SET name = $2, price = $3, category = $4, stock = $5, image = $6, rating = $7,
         description = $8, about_items = $9, specifications = $10, updated_at = $11
       WHERE id = $1",
    )
    .bind(p.id)
    .bind(&p.name)
    .bind(p.price)
    .bind(&p.category)
    .bind(p.stock)
    .bind(&p.image)
    .bind(p.rating)
    .bind(&p.description)
    .bind(Json(&p.about_items))
    .bind(Json(&p.specifications))
    .bind(p.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::try_decrement_stock", skip(self))]
  async fn try_decrement_stock(&self, id: Uuid, quantity: i32) -> Result<Option<i32>> {
    let remaining = sqlx::query_scalar::<_, i32>(
      "UPDATE products SET stock = stock - $2, updated_at = now()
       WHERE id = $1 AND stock >= $2
       RETURNING stock",
    )
    .bind(id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    Ok(remaining)
  }

  async fn restock(&self, id: Uuid, quantity: i32) -> Result<()> {
    sqlx::query("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1")
      .bind(id)
      .bind(quantity)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let sql = format!("SELECT {} FROM categories ORDER BY code ASC", CATEGORY_COLUMNS);
    Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
    Ok(sqlx::query_as::<_, Category>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn insert_category(&self, c: &Category) -> Result<()> {
    sqlx::query("INSERT INTO categories (id, code, name, image, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(c.id)
      .bind(&c.code)
      .bind(&c.name)
      .bind(&c.image)
      .bind(c.created_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn update_category(&self, c: &Category) -> Result<bool> {
    let result = sqlx::query("UPDATE categories SET name = $2, image = $3 WHERE id = $1")
      .bind(c.id)
      .bind(&c.name)
      .bind(&c.image)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_carousels(&self) -> Result<Vec<Carousel>> {
    let sql = format!("SELECT {} FROM carousels ORDER BY created_at DESC", CAROUSEL_COLUMNS);
    Ok(sqlx::query_as::<_, Carousel>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_carousel(&self, id: Uuid) -> Result<Option<Carousel>> {
    let sql = format!("SELECT {} FROM carousels WHERE id = $1", CAROUSEL_COLUMNS);
    Ok(sqlx::query_as::<_, Carousel>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn insert_carousel(&self, c: &Carousel) -> Result<()> {
    sqlx::query("INSERT INTO carousels (id, code, title, image, created_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(c.id)
      .bind(&c.code)
      .bind(&c.title)
      .bind(&c.image)
      .bind(c.created_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn update_carousel(&self, c: &Carousel) -> Result<bool> {
    let result = sqlx::query("UPDATE carousels SET title = $2, image = $3 WHERE id = $1")
      .bind(c.id)
      .bind(&c.title)
      .bind(&c.image)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_carousel(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM carousels WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_deals(&self) -> Result<Vec<Deal>> {
    let sql = format!("SELECT {} FROM deals ORDER BY created_at DESC", DEAL_COLUMNS);
    Ok(sqlx::query_as::<_, Deal>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_deal(&self, id: Uuid) -> Result<Option<Deal>> {
    let sql = format!("SELECT {} FROM deals WHERE id = $1", DEAL_COLUMNS);
    Ok(sqlx::query_as::<_, Deal>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_deal_by_code(&self, code: &str) -> Result<Option<Deal>> {
    let sql = format!("SELECT {} FROM deals WHERE code = $1", DEAL_COLUMNS);
    Ok(sqlx::query_as::<_, Deal>(&sql).bind(code).fetch_optional(&self.pool).await?)
  }

  async fn insert_deal(&self, d: &Deal) -> Result<()> {
    sqlx::query(
      "INSERT INTO deals (id, code, product_id, category, title, price, discount, final_price, stock, start_date, end_date, status, image, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(d.id)
    .bind(&d.code)
    .bind(d.product_id)
    .bind(&d.category)
    .bind(&d.title)
    .bind(d.price)
    .bind(d.discount)
    .bind(d.final_price)
    .bind(d.stock)
    .bind(d.start_date)
    .bind(d.end_date)
    .bind(d.status)
    .bind(&d.image)
    .bind(d.created_at)
    .bind(d.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_deal(&self, d: &Deal) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE deals SET product_id = $2, category = $3, title = $4, price = $5, discount = $6, final_price = $7,
         stock = $8, start_date = $9, end_date = $10, status = $11, image = $12, updated_at = $13
       WHERE id = $1",
    )
    .bind(d.id)
    .bind(d.product_id)
    .bind(&d.category)
    .bind(&d.title)
    .bind(d.price)
    .bind(d.discount)
    .bind(d.final_price)
    .bind(d.stock)
    .bind(d.start_date)
    .bind(d.end_date)
    .bind(d.status)
    .bind(&d.image)
    .bind(d.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_deal(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM deals WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
  }

  async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE mobile = $1", USER_COLUMNS);
    Ok(sqlx::query_as::<_, User>(&sql).bind(mobile).fetch_optional(&self.pool).await?)
  }

  async fn insert_user(&self, u: &User) -> Result<()> {
    sqlx::query(
      "INSERT INTO users (id, code, name, email, mobile, password_hash, role, addresses, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(u.id)
    .bind(&u.code)
    .bind(&u.name)
    .bind(&u.email)
    .bind(&u.mobile)
    .bind(&u.password_hash)
    .bind(u.role)
    .bind(Json(&u.addresses))
    .bind(u.created_at)
    .bind(u.updated_at)
    .execute(&self.pool)
    .await
    .map_err(user_write_error)?;
    Ok(())
  }

  async fn update_user(&self, u: &User) -> Result<bool> {
    let result = sqlx::query(
      "UPDATE users SET name = $2, email = $3, mobile = $4, password_hash = $5, role = $6, addresses = $7, updated_at = $8
       WHERE id = $1",
    )
    .bind(u.id)
    .bind(&u.name)
    .bind(&u.email)
    .bind(&u.mobile)
    .bind(&u.password_hash)
    .bind(u.role)
    .bind(Json(&u.addresses))
    .bind(u.updated_at)
    .execute(&self.pool)
    .await
    .map_err(user_write_error)?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    let sql = format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?)
  }

  async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE user_email = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    );
    Ok(sqlx::query_as::<_, Order>(&sql).bind(email).fetch_all(&self.pool).await?)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>> {
    let sql = format!("SELECT {} FROM orders WHERE code = $1", ORDER_COLUMNS);
    Ok(sqlx::query_as::<_, Order>(&sql).bind(code).fetch_optional(&self.pool).await?)
  }

  async fn insert_order(&self, o: &Order) -> Result<()> {
    sqlx::query(
      "INSERT INTO orders (id, code, user_id, user_email, cart_items, shipping_address, payment_method, payment_status, status, cancelled_by, total_amount, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(o.id)
    .bind(&o.code)
    .bind(o.user_id)
    .bind(&o.user_email)
    .bind(Json(&o.cart_items))
    .bind(Json(&o.shipping_address))
    .bind(&o.payment_method)
    .bind(&o.payment_status)
    .bind(o.status)
    .bind(o.cancelled_by)
    .bind(o.total_amount)
    .bind(o.created_at)
    .bind(o.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn update_order(&self, o: &Order) -> Result<bool> {
    // Line items and totals are a frozen snapshot; only lifecycle fields change.
    let result = sqlx::query(
      "UPDATE orders SET payment_status = $2, status = $3, cancelled_by = $4, updated_at = $5 WHERE id = $1",
    )
    .bind(o.id)
    .bind(&o.payment_status)
    .bind(o.status)
    .bind(o.cancelled_by)
    .bind(o.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1").bind(id).execute(&self.pool).await?;
    Ok(result.rows_affected() > 0)
  }

  async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>> {
    let stats = sqlx::query_as::<_, MonthlyStats>(
      "SELECT to_char(date_trunc('month', created_at), 'YYYY-MM') AS month,
              COUNT(*)::BIGINT AS total_orders,
              COALESCE(SUM(total_amount), 0)::BIGINT AS total_revenue
       FROM orders
       GROUP BY 1
       ORDER BY 1",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(stats)
  }
}
