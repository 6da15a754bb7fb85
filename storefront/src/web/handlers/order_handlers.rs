// ishop/src/web/handlers/order_handlers.rs

use crate::errors::AppError;
use crate::pipelines::contexts::{
  CancelOrderCtxData, DeleteOrderCtxData, PlaceOrderCtxData, PlaceOrderRequest, UpdateOrderStatusCtxData,
};
use crate::pipelines::register_pipeline::normalize_email;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use shopflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub payment_status: Option<String>,
}

fn halted(operation: &str) -> AppError {
  warn!(operation, "Order pipeline stopped before completion.");
  AppError::Internal(format!("{} was halted", operation))
}

#[instrument(
  name = "handler::place_order",
  skip(app_state, auth_user, req_payload),
  fields(user_id = %auth_user.user_id, lines = req_payload.cart_items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(PlaceOrderCtxData::new(
    app_state.get_ref().clone(),
    auth_user.user_id,
    req_payload.into_inner(),
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx.read();
      let order = guard
        .order
        .clone()
        .ok_or_else(|| AppError::Internal("Order placement completed without an order".to_string()))?;
      info!(
        order_code = %order.code,
        total = order.total_amount,
        notified = guard.notifications_delivered,
        "Order placed."
      );
      Ok(HttpResponse::Created().json(json!({ "message": "Order placed successfully", "order": order })))
    }
    Ok(PipelineResult::Stopped) => Err(halted("Order placement")),
    Err(app_err) => {
      warn!(error = %app_err, "Order placement failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::list_orders", skip(app_state, _admin))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.store.list_orders().await?))
}

#[instrument(name = "handler::orders_for_user", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn orders_for_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let email = normalize_email(&path.into_inner());
  if !auth_user.is_admin() {
    let caller = app_state
      .store
      .get_user(auth_user.user_id)
      .await?
      .ok_or_else(|| AppError::Auth("Account no longer exists".to_string()))?;
    if caller.email != email {
      return Err(AppError::Forbidden("Access denied".to_string()));
    }
  }

  let orders = app_state.store.orders_for_email(&email).await?;
  if orders.is_empty() {
    return Err(AppError::NotFound("No orders found".to_string()));
  }
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .store
    .find_order_by_code(&path.into_inner())
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  auth_user.ensure_self_or_admin(order.user_id)?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::update_order_status", skip(app_state, _admin, req_payload))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = ContextData::new(UpdateOrderStatusCtxData {
    app_state: app_state.get_ref().clone(),
    order_id: path.into_inner(),
    requested_status: payload.status,
    payment_status: payload.payment_status,
    order: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let order = ctx.read().order.clone();
      Ok(HttpResponse::Ok().json(json!({ "message": "Order status updated", "order": order })))
    }
    PipelineResult::Stopped => Err(halted("Status update")),
  }
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(CancelOrderCtxData {
    app_state: app_state.get_ref().clone(),
    order_code: path.into_inner(),
    requester_id: auth_user.user_id,
    requester_role: auth_user.role,
    order: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => Ok(HttpResponse::Ok().json(ctx.read().order.clone())),
    PipelineResult::Stopped => Err(halted("Cancellation")),
  }
}

#[instrument(name = "handler::delete_order", skip(app_state, _admin))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(DeleteOrderCtxData {
    app_state: app_state.get_ref().clone(),
    order_id: path.into_inner(),
    order: None,
  });

  match app_state.flows.run(ctx).await? {
    PipelineResult::Completed => Ok(HttpResponse::Ok().json(json!({ "message": "Order cancelled successfully" }))),
    PipelineResult::Stopped => Err(halted("Order deletion")),
  }
}
