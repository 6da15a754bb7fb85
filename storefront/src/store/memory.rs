// ishop/src/store/memory.rs

//! Process-local store used by tests and `STORE_BACKEND=memory`.

use super::{CodeKind, MonthlyStats, Store};
use crate::errors::Result;
use crate::models::{Carousel, Category, Deal, Order, Product, User};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

type Table<T> = RwLock<HashMap<Uuid, T>>;

#[derive(Default)]
pub struct MemoryStore {
  products: Table<Product>,
  categories: Table<Category>,
  carousels: Table<Carousel>,
  deals: Table<Deal>,
  users: Table<User>,
  orders: Table<Order>,
  sequences: Mutex<HashMap<String, i64>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn insert<T: Clone>(table: &Table<T>, id: Uuid, value: &T) {
  table.write().insert(id, value.clone());
}

fn replace<T: Clone>(table: &Table<T>, id: Uuid, value: &T) -> bool {
  match table.write().get_mut(&id) {
    Some(slot) => {
      *slot = value.clone();
      true
    }
    None => false,
  }
}

fn remove<T>(table: &Table<T>, id: Uuid) -> bool {
  table.write().remove(&id).is_some()
}

fn fetch<T: Clone>(table: &Table<T>, id: Uuid) -> Option<T> {
  table.read().get(&id).cloned()
}

fn find<T: Clone>(table: &Table<T>, pred: impl Fn(&T) -> bool) -> Option<T> {
  table.read().values().find(|v| pred(*v)).cloned()
}

fn clashes_with_other_user(users: &HashMap<Uuid, User>, user: &User) -> bool {
  users
    .values()
    .any(|other| other.id != user.id && (other.email == user.email || other.mobile == user.mobile))
}

#[async_trait]
impl Store for MemoryStore {
  async fn code_taken(&self, kind: CodeKind, code: &str) -> Result<bool> {
    let taken = match kind {
      CodeKind::Product => self.products.read().values().any(|p| p.code == code),
      CodeKind::Category => self.categories.read().values().any(|c| c.code == code),
      CodeKind::Carousel => self.carousels.read().values().any(|c| c.code == code),
      CodeKind::Deal => self.deals.read().values().any(|d| d.code == code),
      CodeKind::User => self.users.read().values().any(|u| u.code == code),
      CodeKind::Order => self.orders.read().values().any(|o| o.code == code),
    };
    Ok(taken)
  }

  async fn next_sequence(&self, name: &str) -> Result<i64> {
    let mut sequences = self.sequences.lock();
    let value = sequences.entry(name.to_string()).or_insert(0);
    *value += 1;
    Ok(*value)
  }

  async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>> {
    let mut products: Vec<Product> = self
      .products
      .read()
      .values()
      .filter(|p| category.map_or(true, |c| p.category == c))
      .cloned()
      .collect();
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(products)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(fetch(&self.products, id))
  }

  async fn insert_product(&self, product: &Product) -> Result<()> {
    insert(&self.products, product.id, product);
    Ok(())
  }

  async fn update_product(&self, product: &Product) -> Result<bool> {
    Ok(replace(&self.products, product.id, product))
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.products, id))
  }

  async fn try_decrement_stock(&self, id: Uuid, quantity: i32) -> Result<Option<i32>> {
    // Check and write under one lock so two buyers cannot both pass the check.
    let mut products = self.products.write();
    match products.get_mut(&id) {
      Some(product) if product.stock >= quantity => {
        product.stock -= quantity;
        product.updated_at = chrono::Utc::now();
        Ok(Some(product.stock))
      }
      _ => Ok(None),
    }
  }

  async fn restock(&self, id: Uuid, quantity: i32) -> Result<()> {
    if let Some(product) = self.products.write().get_mut(&id) {
      product.stock += quantity;
      product.updated_at = chrono::Utc::now();
    }
    Ok(())
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    let mut categories: Vec<Category> = self.categories.read().values().cloned().collect();
    categories.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(categories)
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    Ok(fetch(&self.categories, id))
  }

  async fn insert_category(&self, category: &Category) -> Result<()> {
    insert(&self.categories, category.id, category);
    Ok(())
  }

  async fn update_category(&self, category: &Category) -> Result<bool> {
    Ok(replace(&self.categories, category.id, category))
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.categories, id))
  }

  async fn list_carousels(&self) -> Result<Vec<Carousel>> {
    let mut slides: Vec<Carousel> = self.carousels.read().values().cloned().collect();
    slides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(slides)
  }

  async fn get_carousel(&self, id: Uuid) -> Result<Option<Carousel>> {
    Ok(fetch(&self.carousels, id))
  }

  async fn insert_carousel(&self, carousel: &Carousel) -> Result<()> {
    insert(&self.carousels, carousel.id, carousel);
    Ok(())
  }

  async fn update_carousel(&self, carousel: &Carousel) -> Result<bool> {
    Ok(replace(&self.carousels, carousel.id, carousel))
  }

  async fn delete_carousel(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.carousels, id))
  }

  async fn list_deals(&self) -> Result<Vec<Deal>> {
    let mut deals: Vec<Deal> = self.deals.read().values().cloned().collect();
    deals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(deals)
  }

  async fn get_deal(&self, id: Uuid) -> Result<Option<Deal>> {
    Ok(fetch(&self.deals, id))
  }

  async fn find_deal_by_code(&self, code: &str) -> Result<Option<Deal>> {
    Ok(find(&self.deals, |d| d.code == code))
  }

  async fn insert_deal(&self, deal: &Deal) -> Result<()> {
    insert(&self.deals, deal.id, deal);
    Ok(())
  }

  async fn update_deal(&self, deal: &Deal) -> Result<bool> {
    Ok(replace(&self.deals, deal.id, deal))
  }

  async fn delete_deal(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.deals, id))
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let mut users: Vec<User> = self.users.read().values().cloned().collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(users)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(fetch(&self.users, id))
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(find(&self.users, |u| u.email == email))
  }

  async fn find_user_by_mobile(&self, mobile: &str) -> Result<Option<User>> {
    Ok(find(&self.users, |u| u.mobile == mobile))
  }

  async fn insert_user(&self, user: &User) -> Result<()> {
    // Check and insert under one lock, like the unique indexes on `users`.
    let mut users = self.users.write();
    if clashes_with_other_user(&users, user) {
      return Err(super::duplicate_user());
    }
    users.insert(user.id, user.clone());
    Ok(())
  }

  async fn update_user(&self, user: &User) -> Result<bool> {
    let mut users = self.users.write();
    if !users.contains_key(&user.id) {
      return Ok(false);
    }
    if clashes_with_other_user(&users, user) {
      return Err(super::duplicate_user());
    }
    users.insert(user.id, user.clone());
    Ok(true)
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.users, id))
  }

  async fn list_orders(&self) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self.orders.read().values().cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn orders_for_email(&self, email: &str) -> Result<Vec<Order>> {
    let mut orders: Vec<Order> = self
      .orders
      .read()
      .values()
      .filter(|o| o.user_email == email)
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    Ok(fetch(&self.orders, id))
  }

  async fn find_order_by_code(&self, code: &str) -> Result<Option<Order>> {
    Ok(find(&self.orders, |o| o.code == code))
  }

  async fn insert_order(&self, order: &Order) -> Result<()> {
    insert(&self.orders, order.id, order);
    Ok(())
  }

  async fn update_order(&self, order: &Order) -> Result<bool> {
    Ok(replace(&self.orders, order.id, order))
  }

  async fn delete_order(&self, id: Uuid) -> Result<bool> {
    Ok(remove(&self.orders, id))
  }

  async fn monthly_stats(&self) -> Result<Vec<MonthlyStats>> {
    let mut by_month: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for order in self.orders.read().values() {
      let entry = by_month.entry(order.created_at.format("%Y-%m").to_string()).or_default();
      entry.0 += 1;
      entry.1 += order.total_amount;
    }
    Ok(
      by_month
        .into_iter()
        .map(|(month, (total_orders, total_revenue))| MonthlyStats {
          month,
          total_orders,
          total_revenue,
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::AppError;
  use crate::models::{OrderStatus, ShippingAddress};
  use chrono::{TimeZone, Utc};

  fn product(stock: i32) -> Product {
    let now = Utc::now();
    Product {
      id: Uuid::new_v4(),
      code: "P12ABCDE34".to_string(),
      name: "Kettle".to_string(),
      price: 60,
      category: "Kitchen".to_string(),
      stock,
      image: None,
      rating: 4.0,
      description: String::new(),
      about_items: Vec::new(),
      specifications: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }

  fn order_at(year: i32, month: u32, total_amount: i64) -> Order {
    let created_at = Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap();
    Order {
      id: Uuid::new_v4(),
      code: format!("ORD{}{}", year, month),
      user_id: Uuid::new_v4(),
      user_email: "stats@example.com".to_string(),
      cart_items: Vec::new(),
      shipping_address: ShippingAddress::default(),
      payment_method: "COD".to_string(),
      payment_status: None,
      status: OrderStatus::Pending,
      cancelled_by: None,
      total_amount,
      created_at,
      updated_at: created_at,
    }
  }

  #[tokio::test]
  async fn conditional_decrement_never_goes_below_zero() {
    let store = MemoryStore::new();
    let kettle = product(3);
    store.insert_product(&kettle).await.unwrap();

    assert_eq!(store.try_decrement_stock(kettle.id, 2).await.unwrap(), Some(1));
    assert_eq!(store.try_decrement_stock(kettle.id, 2).await.unwrap(), None);
    assert_eq!(store.get_product(kettle.id).await.unwrap().unwrap().stock, 1);

    store.restock(kettle.id, 2).await.unwrap();
    assert_eq!(store.get_product(kettle.id).await.unwrap().unwrap().stock, 3);
    assert_eq!(store.try_decrement_stock(Uuid::new_v4(), 1).await.unwrap(), None);
  }

  #[tokio::test]
  async fn sequences_count_independently() {
    let store = MemoryStore::new();
    assert_eq!(store.next_sequence("category").await.unwrap(), 1);
    assert_eq!(store.next_sequence("category").await.unwrap(), 2);
    assert_eq!(store.next_sequence("deal").await.unwrap(), 1);
  }

  #[tokio::test]
  async fn monthly_stats_group_by_calendar_month() {
    let store = MemoryStore::new();
    store.insert_order(&order_at(2024, 3, 100)).await.unwrap();
    store.insert_order(&order_at(2024, 1, 40)).await.unwrap();
    store.insert_order(&order_at(2024, 3, 60)).await.unwrap();

    let stats = store.monthly_stats().await.unwrap();
    assert_eq!(
      stats,
      vec![
        MonthlyStats {
          month: "2024-01".to_string(),
          total_orders: 1,
          total_revenue: 40,
        },
        MonthlyStats {
          month: "2024-03".to_string(),
          total_orders: 2,
          total_revenue: 160,
        },
      ]
    );
  }

  fn user(email: &str, mobile: &str) -> User {
    let now = Utc::now();
    User {
      id: Uuid::new_v4(),
      code: format!("U{}", mobile),
      name: "Asha".to_string(),
      email: email.to_string(),
      mobile: mobile.to_string(),
      password_hash: String::new(),
      role: crate::models::Role::User,
      addresses: Vec::new(),
      created_at: now,
      updated_at: now,
    }
  }

  #[tokio::test]
  async fn user_email_and_mobile_stay_unique() {
    let store = MemoryStore::new();
    let asha = user("asha@example.com", "9000000001");
    store.insert_user(&asha).await.unwrap();

    let same_email = user("asha@example.com", "9000000002");
    assert!(matches!(store.insert_user(&same_email).await, Err(AppError::Validation(_))));
    let same_mobile = user("other@example.com", "9000000001");
    assert!(matches!(store.insert_user(&same_mobile).await, Err(AppError::Validation(_))));
    assert_eq!(store.list_users().await.unwrap().len(), 1);

    let ravi = user("ravi@example.com", "9000000003");
    store.insert_user(&ravi).await.unwrap();
    let mut taken = ravi.clone();
    taken.email = asha.email.clone();
    assert!(matches!(store.update_user(&taken).await, Err(AppError::Validation(_))));

    // Re-saving a user with its own email and mobile is not a clash.
    let mut renamed = asha.clone();
    renamed.name = "Asha K".to_string();
    assert!(store.update_user(&renamed).await.unwrap());
  }

  #[tokio::test]
  async fn deleting_a_user_keeps_their_orders() {
    let store = MemoryStore::new();
    let asha = user("asha@example.com", "9000000001");
    store.insert_user(&asha).await.unwrap();
    let mut order = order_at(2024, 5, 80);
    order.user_id = asha.id;
    order.user_email = asha.email.clone();
    store.insert_order(&order).await.unwrap();

    assert!(store.delete_user(asha.id).await.unwrap());
    assert_eq!(store.orders_for_email(&asha.email).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn code_lookup_is_per_table() {
    let store = MemoryStore::new();
    store.insert_product(&product(1)).await.unwrap();
    assert!(store.code_taken(CodeKind::Product, "P12ABCDE34").await.unwrap());
    assert!(!store.code_taken(CodeKind::Order, "P12ABCDE34").await.unwrap());
  }
}
