// ishop/src/pipelines/place_order_pipeline.rs

use crate::errors::AppError;
use crate::models::{Order, OrderLine, OrderStatus, Product};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{PlaceOrderCtxData, StockReservation};
use crate::services::{ids, pricing, NotificationKind};
use chrono::Utc;
use shopflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, info, warn, Level};
use uuid::Uuid;

/// Upper bound for a single cart line's quantity.
pub const MAX_LINE_QUANTITY: i32 = 1_000;

fn quantity_too_large(product_name: &str) -> AppError {
  AppError::Validation(format!("Quantity for product {} is too large", product_name))
}

/// Registers the order placement pipeline.
///
/// Stock is taken with conditional decrements in `reserve_stock`; if that step
/// or any later one fails, its compensator puts every recorded reservation
/// back before the error reaches the caller.
pub fn register_place_order_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(&[
    ("validate_order_request", false, None),
    ("load_customer", false, None),
    ("resolve_cart_lines", false, None),
    ("reserve_stock", false, None),
    ("assign_order_code", false, None),
    ("persist_order", false, None),
    ("notify_order_placed", true, None),
  ]);

  p.on_root("validate_order_request", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let request = ctx_data.read().request.clone();

      if request.cart_items.is_empty() {
        return Err(AppError::Validation("Cart is empty".to_string()));
      }
      if let Some(line) = request
        .cart_items
        .iter()
        .find(|l| !(1..=MAX_LINE_QUANTITY).contains(&l.quantity))
      {
        warn!(product_id = %line.product_id, quantity = line.quantity, "Rejected out-of-range quantity.");
        return Err(AppError::Validation(format!(
          "Quantity for product {} must be between 1 and {}",
          line.product_id, MAX_LINE_QUANTITY
        )));
      }
      if !request.shipping_address.is_complete() {
        return Err(AppError::Validation("Incomplete shipping address".to_string()));
      }
      if request.payment_method.trim().is_empty() {
        return Err(AppError::Validation("Payment method is required".to_string()));
      }
      let initial_status = match request.status.as_deref() {
        Some(raw) => Some(raw.parse::<OrderStatus>().map_err(AppError::Validation)?),
        None => None,
      };

      ctx_data.write().initial_status = initial_status;
      event!(Level::DEBUG, lines = request.cart_items.len(), "Order request validated.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("load_customer", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, customer_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.customer_id)
      };

      let customer = store
        .get_user(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

      ctx_data.write().customer_email = Some(customer.email);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("resolve_cart_lines", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, items) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.request.cart_items.clone())
      };

      let mut products: HashMap<Uuid, Product> = HashMap::new();
      let mut wanted: HashMap<Uuid, i32> = HashMap::new();
      let mut lines = Vec::with_capacity(items.len());

      for item in &items {
        let product = match products.get(&item.product_id) {
          Some(p) => p.clone(),
          None => {
            let p = store
              .get_product(item.product_id)
              .await?
              .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;
            products.insert(p.id, p.clone());
            p
          }
        };

        let total_wanted = wanted.entry(product.id).or_insert(0);
        *total_wanted = total_wanted
          .checked_add(item.quantity)
          .ok_or_else(|| quantity_too_large(&product.name))?;
        if *total_wanted > product.stock {
          warn!(product = %product.name, wanted = *total_wanted, stock = product.stock, "Insufficient stock.");
          return Err(AppError::Validation(format!(
            "Insufficient stock for product {}",
            product.name
          )));
        }

        let deal = match item.deal_id.as_deref().filter(|code| !code.trim().is_empty()) {
          Some(code) => Some(
            store
              .find_deal_by_code(code)
              .await?
              .ok_or_else(|| AppError::NotFound(format!("Deal {} not found", code)))?,
          ),
          None => None,
        };

        let priced = pricing::price_line(&product, deal.as_ref());
        let line_total = priced
          .unit_price
          .checked_mul(i64::from(item.quantity))
          .ok_or_else(|| quantity_too_large(&product.name))?;
        lines.push(OrderLine {
          product_id: product.id,
          deal_id: deal.map(|d| d.code),
          product_name: priced.title,
          product_image: priced.image,
          product_category: product.category.clone(),
          price: priced.unit_price,
          original_price: priced.original_price,
          discount: priced.discount,
          quantity: item.quantity,
          total_amount: line_total,
        });
      }

      ctx_data.write().lines = lines;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("reserve_stock", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, lines) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.lines.clone())
      };

      for line in &lines {
        match store.try_decrement_stock(line.product_id, line.quantity).await? {
          Some(remaining) => {
            ctx_data.write().reservations.push(StockReservation {
              product_id: line.product_id,
              quantity: line.quantity,
            });
            event!(Level::DEBUG, product_id = %line.product_id, remaining, "Stock reserved.");
          }
          None => {
            // Another order took the units between resolution and reservation.
            warn!(product_id = %line.product_id, "Conditional stock decrement failed.");
            return Err(AppError::Validation(format!(
              "Insufficient stock for product {}",
              line.product_name
            )));
          }
        }
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.compensate_root("reserve_stock", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, reservations) = {
        let mut guard = ctx_data.write();
        (guard.app_state.store.clone(), std::mem::take(&mut guard.reservations))
      };

      for reservation in reservations.iter().rev() {
        store.restock(reservation.product_id, reservation.quantity).await?;
      }
      info!(released = reservations.len(), "Released stock reservations.");
      Ok::<_, AppError>(())
    })
  });

  p.on_root("assign_order_code", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let store = ctx_data.read().app_state.store.clone();
      let code = ids::ORDER.allocate(store.as_ref()).await?;
      ctx_data.write().order_code = Some(code);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("persist_order", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (store, order) = {
        let guard = ctx_data.read();
        let code = guard
          .order_code
          .clone()
          .ok_or_else(|| AppError::Internal("Order code was not assigned".to_string()))?;
        let customer_email = guard
          .customer_email
          .clone()
          .ok_or_else(|| AppError::Internal("Customer was not loaded".to_string()))?;
        let total_amount = guard
          .lines
          .iter()
          .try_fold(0i64, |sum, l| sum.checked_add(l.total_amount))
          .ok_or_else(|| AppError::Validation("Order total is too large".to_string()))?;
        let now = Utc::now();
        let order = Order {
          id: Uuid::new_v4(),
          code,
          user_id: guard.customer_id,
          user_email: customer_email,
          total_amount,
          cart_items: guard.lines.clone(),
          shipping_address: guard.request.shipping_address.clone(),
          payment_method: guard.request.payment_method.trim().to_string(),
          payment_status: None,
          status: guard.initial_status.unwrap_or(OrderStatus::Pending),
          cancelled_by: None,
          created_at: now,
          updated_at: now,
        };
        (guard.app_state.store.clone(), order)
      };

      store.insert_order(&order).await?;
      info!(order_code = %order.code, total = order.total_amount, "Order persisted.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_order_placed", |ctx_data: ContextData<PlaceOrderCtxData>| {
    Box::pin(async move {
      let (hub, order) = {
        let guard = ctx_data.read();
        (guard.app_state.hub.clone(), guard.order.clone())
      };
      let Some(order) = order else {
        warn!("No persisted order to announce.");
        return Ok::<_, AppError>(PipelineControl::Continue);
      };

      let delivered = common_steps::notify_order(
        &hub,
        NotificationKind::OrderCreated,
        &order,
        format!("New order placed by {}", order.user_email),
        "Your order has been placed successfully!".to_string(),
      );
      ctx_data.write().notifications_delivered = delivered;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Place-order pipeline registered.");
}
