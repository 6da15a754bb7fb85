// tests/order_flow_tests.rs
mod common;

use common::*;
use ishop::errors::AppError;
use ishop::models::{CancelledBy, OrderStatus, Role};
use ishop::pipelines::contexts::{
  CancelOrderCtxData, CartLineRequest, DeleteOrderCtxData, PlaceOrderCtxData, PlaceOrderRequest,
  UpdateOrderStatusCtxData,
};
use ishop::services::Topic;
use ishop::state::AppState;
use serial_test::serial;
use shopflow::{ContextData, PipelineResult};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn line(product_id: Uuid, quantity: i32) -> CartLineRequest {
  CartLineRequest {
    product_id,
    deal_id: None,
    quantity,
  }
}

fn request(cart_items: Vec<CartLineRequest>) -> PlaceOrderRequest {
  PlaceOrderRequest {
    cart_items,
    shipping_address: shipping_address(),
    payment_method: "COD".to_string(),
    status: None,
  }
}

async fn place(state: &AppState, customer_id: Uuid, req: PlaceOrderRequest) -> Result<ContextData<PlaceOrderCtxData>, AppError> {
  let ctx = ContextData::new(PlaceOrderCtxData::new(state.clone(), customer_id, req));
  let result = state.flows.run(ctx.clone()).await?;
  assert_eq!(result, PipelineResult::Completed);
  Ok(ctx)
}

async fn cancel(state: &AppState, code: &str, requester_id: Uuid, requester_role: Role) -> Result<ContextData<CancelOrderCtxData>, AppError> {
  let ctx = ContextData::new(CancelOrderCtxData {
    app_state: state.clone(),
    order_code: code.to_string(),
    requester_id,
    requester_role,
    order: None,
  });
  state.flows.run(ctx.clone()).await?;
  Ok(ctx)
}

#[tokio::test]
#[serial]
async fn placing_an_order_charges_product_price_and_takes_stock() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "asha@example.com", "9876543210", Role::User).await;
  let phone = insert_product(&state, "Phone", 100, 5).await;

  let ctx = place(&state, shopper.id, request(vec![line(phone.id, 2)])).await.unwrap();

  let order = ctx.read().order.clone().unwrap();
  assert_eq!(order.total_amount, 200);
  assert_eq!(order.lines_total(), order.total_amount);
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.user_email, "asha@example.com");
  assert!(order.code.starts_with("ORD"));
  assert_eq!(order.cart_items[0].price, 100);
  assert_eq!(order.cart_items[0].product_name, "Phone");

  let stored = state.store.get_product(phone.id).await.unwrap().unwrap();
  assert_eq!(stored.stock, 3);
}

#[tokio::test]
#[serial]
async fn deal_lines_are_charged_the_locked_deal_price() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "deal@example.com", "9876500001", Role::User).await;
  let headphones = insert_product(&state, "Headphones", 90, 10).await;
  let deal = insert_deal(&state, "TDE0001", &headphones, 20).await;
  assert_eq!(deal.final_price, 72);

  // A later product price change does not move the deal price.
  let mut repriced = headphones.clone();
  repriced.price = 120;
  state.store.update_product(&repriced).await.unwrap();

  let mut req = request(vec![line(headphones.id, 1)]);
  req.cart_items[0].deal_id = Some(deal.code.clone());
  let ctx = place(&state, shopper.id, req).await.unwrap();

  let order = ctx.read().order.clone().unwrap();
  let charged = &order.cart_items[0];
  assert_eq!(charged.price, 72);
  assert_eq!(charged.original_price, 90);
  assert_eq!(charged.discount, 20);
  assert_eq!(charged.deal_id.as_deref(), Some("TDE0001"));
  assert_eq!(order.total_amount, 72);
}

#[tokio::test]
#[serial]
async fn insufficient_stock_on_a_later_line_leaves_every_product_untouched() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "short@example.com", "9876500002", Role::User).await;
  let plenty = insert_product(&state, "Cable", 10, 50).await;
  let scarce = insert_product(&state, "Console", 500, 1).await;

  let err = place(&state, shopper.id, request(vec![line(plenty.id, 3), line(scarce.id, 2)]))
    .await
    .err()
    .unwrap();

  match err {
    AppError::Validation(message) => assert_eq!(message, "Insufficient stock for product Console"),
    other => panic!("unexpected error: {:?}", other),
  }
  assert_eq!(state.store.get_product(plenty.id).await.unwrap().unwrap().stock, 50);
  assert_eq!(state.store.get_product(scarce.id).await.unwrap().unwrap().stock, 1);
  assert!(state.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn repeated_lines_for_one_product_are_checked_against_combined_quantity() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "twice@example.com", "9876500003", Role::User).await;
  let lamp = insert_product(&state, "Lamp", 40, 3).await;

  let err = place(&state, shopper.id, request(vec![line(lamp.id, 2), line(lamp.id, 2)]))
    .await
    .err()
    .unwrap();

  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(state.store.get_product(lamp.id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
#[serial]
async fn invalid_requests_are_rejected_before_any_stock_moves() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "bad@example.com", "9876500004", Role::User).await;
  let mug = insert_product(&state, "Mug", 15, 4).await;

  let empty = place(&state, shopper.id, request(Vec::new())).await.err().unwrap();
  assert!(matches!(empty, AppError::Validation(ref m) if m == "Cart is empty"));

  let zero = place(&state, shopper.id, request(vec![line(mug.id, 0)])).await.err().unwrap();
  assert!(matches!(zero, AppError::Validation(_)));

  let mut no_address = request(vec![line(mug.id, 1)]);
  no_address.shipping_address.city = String::new();
  let incomplete = place(&state, shopper.id, no_address).await.err().unwrap();
  assert!(matches!(incomplete, AppError::Validation(ref m) if m == "Incomplete shipping address"));

  let missing = place(&state, shopper.id, request(vec![line(Uuid::new_v4(), 1)])).await.err().unwrap();
  assert!(matches!(missing, AppError::NotFound(_)));

  assert_eq!(state.store.get_product(mug.id).await.unwrap().unwrap().stock, 4);
}

#[tokio::test]
#[serial]
async fn order_codes_are_unique() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "many@example.com", "9876500005", Role::User).await;
  let pen = insert_product(&state, "Pen", 2, 100).await;

  let mut codes = HashSet::new();
  for _ in 0..20 {
    let ctx = place(&state, shopper.id, request(vec![line(pen.id, 1)])).await.unwrap();
    let code = ctx.read().order.as_ref().unwrap().code.clone();
    assert!(codes.insert(code));
  }
  assert_eq!(state.store.get_product(pen.id).await.unwrap().unwrap().stock, 80);
}

#[tokio::test]
#[serial]
async fn placement_notifies_admin_room_and_owner() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "live@example.com", "9876500006", Role::User).await;
  let watch = insert_product(&state, "Watch", 250, 2).await;
  let mut admin_feed = state.hub.subscribe(Topic::Admin);
  let mut user_feed = state.hub.subscribe(Topic::User(shopper.id));

  let ctx = place(&state, shopper.id, request(vec![line(watch.id, 1)])).await.unwrap();
  assert_eq!(ctx.read().notifications_delivered, 2);

  let admin_frame: serde_json::Value = serde_json::from_str(&admin_feed.try_recv().unwrap()).unwrap();
  assert_eq!(admin_frame["event"], "notification");
  assert_eq!(admin_frame["data"]["type"], "orderCreated");
  assert_eq!(admin_frame["data"]["message"], "New order placed by live@example.com");

  let user_frame: serde_json::Value = serde_json::from_str(&user_feed.try_recv().unwrap()).unwrap();
  assert_eq!(user_frame["data"]["message"], "Your order has been placed successfully!");
  assert!(user_feed.try_recv().is_none());
}

#[tokio::test]
#[serial]
async fn placement_succeeds_with_nobody_listening() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "quiet@example.com", "9876500007", Role::User).await;
  let book = insert_product(&state, "Book", 30, 1).await;

  let ctx = place(&state, shopper.id, request(vec![line(book.id, 1)])).await.unwrap();
  assert_eq!(ctx.read().notifications_delivered, 0);
}

#[tokio::test]
#[serial]
async fn owner_can_cancel_until_delivery() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "undo@example.com", "9876500008", Role::User).await;
  let kettle = insert_product(&state, "Kettle", 60, 5).await;

  let first = place(&state, shopper.id, request(vec![line(kettle.id, 1)])).await.unwrap();
  let first_code = first.read().order.as_ref().unwrap().code.clone();
  let cancelled = cancel(&state, &first_code, shopper.id, Role::User).await.unwrap();
  let order = cancelled.read().order.clone().unwrap();
  assert_eq!(order.status, OrderStatus::Cancelled);
  assert_eq!(order.cancelled_by, Some(CancelledBy::User));

  let second = place(&state, shopper.id, request(vec![line(kettle.id, 1)])).await.unwrap();
  let second_order = second.read().order.clone().unwrap();
  let ctx = ContextData::new(UpdateOrderStatusCtxData {
    app_state: state.clone(),
    order_id: second_order.id,
    requested_status: "Delivered".to_string(),
    payment_status: Some("Paid".to_string()),
    order: None,
  });
  state.flows.run(ctx).await.unwrap();

  let err = cancel(&state, &second_order.code, shopper.id, Role::User).await.err().unwrap();
  assert!(matches!(err, AppError::Validation(ref m) if m == "Delivered orders cannot be cancelled"));
  let stored = state.store.get_order(second_order.id).await.unwrap().unwrap();
  assert_eq!(stored.status, OrderStatus::Delivered);
  assert_eq!(stored.payment_status.as_deref(), Some("Paid"));
}

#[tokio::test]
#[serial]
async fn only_owner_or_admin_may_cancel() {
  setup_tracing();
  let state = memory_state();
  let owner = insert_user(&state, "owner@example.com", "9876500009", Role::User).await;
  let stranger = insert_user(&state, "stranger@example.com", "9876500010", Role::User).await;
  let admin = insert_user(&state, "admin@example.com", "9876500011", Role::Admin).await;
  let fan = insert_product(&state, "Fan", 45, 2).await;

  let placed = place(&state, owner.id, request(vec![line(fan.id, 1)])).await.unwrap();
  let code = placed.read().order.as_ref().unwrap().code.clone();

  let err = cancel(&state, &code, stranger.id, Role::User).await.err().unwrap();
  assert!(matches!(err, AppError::Forbidden(_)));

  let by_admin = cancel(&state, &code, admin.id, Role::Admin).await.unwrap();
  assert_eq!(by_admin.read().order.as_ref().unwrap().cancelled_by, Some(CancelledBy::Admin));
}

#[tokio::test]
#[serial]
async fn unknown_status_is_rejected() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "status@example.com", "9876500012", Role::User).await;
  let desk = insert_product(&state, "Desk", 300, 1).await;
  let placed = place(&state, shopper.id, request(vec![line(desk.id, 1)])).await.unwrap();
  let order_id = placed.read().order.as_ref().unwrap().id;

  let ctx = ContextData::new(UpdateOrderStatusCtxData {
    app_state: state.clone(),
    order_id,
    requested_status: "Teleported".to_string(),
    payment_status: None,
    order: None,
  });
  let err = state.flows.run(ctx).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  assert_eq!(state.store.get_order(order_id).await.unwrap().unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
#[serial]
async fn failed_order_insert_releases_reserved_stock() {
  setup_tracing();
  let state = state_with_store(Arc::new(OrderInsertFailingStore::default()));
  let shopper = insert_user(&state, "rollback@example.com", "9876500013", Role::User).await;
  let chair = insert_product(&state, "Chair", 120, 4).await;
  let table = insert_product(&state, "Table", 400, 2).await;

  let err = place(&state, shopper.id, request(vec![line(chair.id, 3), line(table.id, 2)]))
    .await
    .err()
    .unwrap();

  assert!(matches!(err, AppError::Internal(_)));
  assert_eq!(state.store.get_product(chair.id).await.unwrap().unwrap().stock, 4);
  assert_eq!(state.store.get_product(table.id).await.unwrap().unwrap().stock, 2);
  assert!(state.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn unknown_deal_code_is_not_found() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "nodeal@example.com", "9876500014", Role::User).await;
  let fan = insert_product(&state, "Fan", 70, 3).await;

  let mut with_deal = line(fan.id, 1);
  with_deal.deal_id = Some("DEAL404".to_string());
  let err = place(&state, shopper.id, request(vec![with_deal])).await.err().unwrap();

  assert!(matches!(err, AppError::NotFound(ref m) if m == "Deal DEAL404 not found"));
  assert_eq!(state.store.get_product(fan.id).await.unwrap().unwrap().stock, 3);
}

#[tokio::test]
#[serial]
async fn oversized_quantities_are_rejected_without_overflow() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "bulk@example.com", "9876500015", Role::User).await;
  let bolt = insert_product(&state, "Bolt", 1, i32::MAX).await;

  let err = place(&state, shopper.id, request(vec![line(bolt.id, 5), line(bolt.id, i32::MAX)]))
    .await
    .err()
    .unwrap();
  assert!(matches!(err, AppError::Validation(_)));

  let gold = insert_product(&state, "Gold bar", i64::MAX / 2, 10).await;
  let err = place(&state, shopper.id, request(vec![line(gold.id, 3)])).await.err().unwrap();
  assert!(matches!(err, AppError::Validation(ref m) if m == "Quantity for product Gold bar is too large"));

  // Each line fits on its own; the order total does not.
  let platinum = insert_product(&state, "Platinum bar", i64::MAX / 2 + 2, 10).await;
  let err = place(&state, shopper.id, request(vec![line(gold.id, 1), line(platinum.id, 1)]))
    .await
    .err()
    .unwrap();
  assert!(matches!(err, AppError::Validation(ref m) if m == "Order total is too large"));

  assert_eq!(state.store.get_product(bolt.id).await.unwrap().unwrap().stock, i32::MAX);
  assert_eq!(state.store.get_product(gold.id).await.unwrap().unwrap().stock, 10);
  assert_eq!(state.store.get_product(platinum.id).await.unwrap().unwrap().stock, 10);
  assert!(state.store.list_orders().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn deleting_an_order_notifies_with_its_code_only() {
  setup_tracing();
  let state = memory_state();
  let shopper = insert_user(&state, "gone@example.com", "9876500016", Role::User).await;
  let rug = insert_product(&state, "Rug", 90, 2).await;
  let placed = place(&state, shopper.id, request(vec![line(rug.id, 1)])).await.unwrap();
  let (order_id, code) = {
    let guard = placed.read();
    let order = guard.order.as_ref().unwrap();
    (order.id, order.code.clone())
  };
  let mut admin_feed = state.hub.subscribe(Topic::Admin);
  let mut user_feed = state.hub.subscribe(Topic::User(shopper.id));

  let ctx = ContextData::new(DeleteOrderCtxData {
    app_state: state.clone(),
    order_id,
    order: None,
  });
  state.flows.run(ctx).await.unwrap();

  assert!(state.store.get_order(order_id).await.unwrap().is_none());
  let admin_frame: serde_json::Value = serde_json::from_str(&admin_feed.try_recv().unwrap()).unwrap();
  assert_eq!(admin_frame["data"]["type"], "orderCancelled");
  assert_eq!(admin_frame["data"]["orderId"], code.as_str());
  assert!(admin_frame["data"]["order"].is_null());
  let user_frame: serde_json::Value = serde_json::from_str(&user_feed.try_recv().unwrap()).unwrap();
  assert_eq!(user_frame["data"]["message"], "Your order has been cancelled");
  assert!(user_frame["data"]["order"].is_null());
}
