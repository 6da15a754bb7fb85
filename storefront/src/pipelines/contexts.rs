// ishop/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers wrap these in
//! `shopflow::ContextData` and read the outputs back after the run.

use crate::models::{Order, OrderLine, OrderStatus, Role, ShippingAddress, User};
use crate::state::AppState;
use serde::Deserialize;
use uuid::Uuid;

// --- Order placement ---

fn one() -> i32 {
  1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
  pub product_id: Uuid,
  #[serde(default)]
  pub deal_id: Option<String>,
  #[serde(default = "one")]
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
  #[serde(default)]
  pub cart_items: Vec<CartLineRequest>,
  #[serde(default)]
  pub shipping_address: ShippingAddress,
  #[serde(default)]
  pub payment_method: String,
  #[serde(default)]
  pub status: Option<String>,
}

/// One successful conditional stock decrement, kept so it can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReservation {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub customer_id: Uuid,
  pub request: PlaceOrderRequest,
  pub initial_status: Option<OrderStatus>,
  pub customer_email: Option<String>,
  pub lines: Vec<OrderLine>,
  pub reservations: Vec<StockReservation>,
  pub order_code: Option<String>,
  pub order: Option<Order>,
  pub notifications_delivered: usize,
}

impl PlaceOrderCtxData {
  pub fn new(app_state: AppState, customer_id: Uuid, request: PlaceOrderRequest) -> Self {
    Self {
      app_state,
      customer_id,
      request,
      initial_status: None,
      customer_email: None,
      lines: Vec::new(),
      reservations: Vec::new(),
      order_code: None,
      order: None,
      notifications_delivered: 0,
    }
  }
}

// --- Identity ---

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub mobile: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Clone)]
pub struct RegisterCtxData {
  pub app_state: AppState,
  pub request: RegisterRequest,
  pub created_user: Option<User>,
}

#[derive(Clone)]
pub struct LoginCtxData {
  pub app_state: AppState,
  pub identifier: String,
  pub password: String,
  pub user: Option<User>,
  pub token: Option<String>,
}

// --- Order lifecycle ---

#[derive(Clone)]
pub struct UpdateOrderStatusCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub requested_status: String,
  pub payment_status: Option<String>,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct CancelOrderCtxData {
  pub app_state: AppState,
  pub order_code: String,
  pub requester_id: Uuid,
  pub requester_role: Role,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct DeleteOrderCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub order: Option<Order>,
}
