// ishop/src/pipelines/order_lifecycle_pipeline.rs

//! Post-placement order changes: admin status updates, customer cancellation
//! and admin deletion. Each one ends in an optional notification step.

use crate::errors::AppError;
use crate::models::{CancelledBy, OrderStatus, Role};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{CancelOrderCtxData, DeleteOrderCtxData, UpdateOrderStatusCtxData};
use crate::services::NotificationKind;
use chrono::Utc;
use shopflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

fn order_not_found() -> AppError {
  AppError::NotFound("Order not found".to_string())
}

pub fn register_update_status_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<UpdateOrderStatusCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("apply_status", false, None),
    ("notify_status_change", true, None),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<UpdateOrderStatusCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      let order = store.get_order(order_id).await?.ok_or_else(order_not_found)?;
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("apply_status", |ctx_data: ContextData<UpdateOrderStatusCtxData>| {
    Box::pin(async move {
      let (store, order, requested, payment_status) = {
        let guard = ctx_data.read();
        (
          guard.app_state.store.clone(),
          guard.order.clone(),
          guard.requested_status.clone(),
          guard.payment_status.clone(),
        )
      };
      let mut order = order.ok_or_else(order_not_found)?;
      let status = requested.parse::<OrderStatus>().map_err(AppError::Validation)?;

      order.status = status;
      if let Some(payment_status) = payment_status {
        order.payment_status = Some(payment_status);
      }
      order.updated_at = Utc::now();
      if !store.update_order(&order).await? {
        return Err(order_not_found());
      }
      info!(order_code = %order.code, %status, "Order status updated.");

      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_status_change", |ctx_data: ContextData<UpdateOrderStatusCtxData>| {
    Box::pin(async move {
      let (hub, order) = {
        let guard = ctx_data.read();
        (guard.app_state.hub.clone(), guard.order.clone())
      };
      if let Some(order) = order {
        common_steps::notify_order(
          &hub,
          NotificationKind::OrderUpdated,
          &order,
          format!("Order #{} status updated to {}", order.code, order.status),
          format!("Your order #{} status is now \"{}\"", order.code, order.status),
        );
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Update-order-status pipeline registered.");
}

pub fn register_cancel_order_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<CancelOrderCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("check_cancellable", false, None),
    ("mark_cancelled", false, None),
    ("emit_order_reload", true, None),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let (store, code) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_code.clone())
      };
      let order = store.find_order_by_code(&code).await?.ok_or_else(order_not_found)?;
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("check_cancellable", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let guard = ctx_data.read();
      let order = guard.order.as_ref().ok_or_else(order_not_found)?;
      if guard.requester_role != Role::Admin && order.user_id != guard.requester_id {
        warn!(order_code = %order.code, "Cancellation attempt by non-owner.");
        return Err(AppError::Forbidden("You can only cancel your own orders".to_string()));
      }
      if order.status == OrderStatus::Delivered {
        return Err(AppError::Validation("Delivered orders cannot be cancelled".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("mark_cancelled", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let (store, order, cancelled_by) = {
        let guard = ctx_data.read();
        let by_owner = guard.order.as_ref().map_or(false, |o| o.user_id == guard.requester_id);
        let cancelled_by = if by_owner || guard.requester_role != Role::Admin {
          CancelledBy::User
        } else {
          CancelledBy::Admin
        };
        (guard.app_state.store.clone(), guard.order.clone(), cancelled_by)
      };
      let mut order = order.ok_or_else(order_not_found)?;

      order.status = OrderStatus::Cancelled;
      order.cancelled_by = Some(cancelled_by);
      order.updated_at = Utc::now();
      if !store.update_order(&order).await? {
        return Err(order_not_found());
      }
      info!(order_code = %order.code, ?cancelled_by, "Order cancelled.");

      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("emit_order_reload", |ctx_data: ContextData<CancelOrderCtxData>| {
    Box::pin(async move {
      let (hub, order) = {
        let guard = ctx_data.read();
        (guard.app_state.hub.clone(), guard.order.clone())
      };
      if let Some(order) = order {
        common_steps::emit_order_reload(&hub, &order);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Cancel-order pipeline registered.");
}

pub fn register_delete_order_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<DeleteOrderCtxData, AppError>::new(&[
    ("load_order", false, None),
    ("check_deletable", false, None),
    ("delete_order", false, None),
    ("notify_order_cancelled", true, None),
  ]);

  p.on_root("load_order", |ctx_data: ContextData<DeleteOrderCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      let order = store.get_order(order_id).await?.ok_or_else(order_not_found)?;
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("check_deletable", |ctx_data: ContextData<DeleteOrderCtxData>| {
    Box::pin(async move {
      let deletable = ctx_data.read().order.as_ref().map_or(false, |o| o.status.is_deletable());
      if !deletable {
        return Err(AppError::Validation("Only pending orders can be cancelled".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("delete_order", |ctx_data: ContextData<DeleteOrderCtxData>| {
    Box::pin(async move {
      let (store, order_id) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.order_id)
      };
      if !store.delete_order(order_id).await? {
        return Err(order_not_found());
      }
      info!(%order_id, "Order deleted by admin.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("notify_order_cancelled", |ctx_data: ContextData<DeleteOrderCtxData>| {
    Box::pin(async move {
      let (hub, order) = {
        let guard = ctx_data.read();
        (guard.app_state.hub.clone(), guard.order.clone())
      };
      if let Some(order) = order {
        common_steps::notify_order_removed(
          &hub,
          NotificationKind::OrderCancelled,
          &order,
          format!("Order #{} has been cancelled", order.code),
          "Your order has been cancelled".to_string(),
        );
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Delete-order pipeline registered.");
}
