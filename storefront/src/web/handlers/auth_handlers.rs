// ishop/src/web/handlers/auth_handlers.rs

use crate::errors::AppError;
use crate::pipelines::contexts::{LoginCtxData, RegisterCtxData, RegisterRequest};
use crate::pipelines::register_pipeline::normalize_email;
use crate::services::auth_service;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use shopflow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};

#[derive(Deserialize)]
pub struct LoginRequestPayload {
  #[serde(default)]
  pub identifier: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
  #[serde(default)]
  pub email_or_mobile: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub confirm_password: String,
}

#[instrument(name = "handler::register", skip(app_state, req_payload), fields(email = %req_payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = ContextData::new(RegisterCtxData {
    app_state: app_state.get_ref().clone(),
    request: req_payload.into_inner(),
    created_user: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let user = ctx
        .read()
        .created_user
        .clone()
        .ok_or_else(|| AppError::Internal("Registration completed without an account".to_string()))?;
      info!(user_id = %user.id, "Registration successful.");
      Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user": user,
      })))
    }
    PipelineResult::Stopped => {
      warn!("Register pipeline stopped unexpectedly.");
      Err(AppError::Internal("Registration was halted".to_string()))
    }
  }
}

#[instrument(name = "handler::login", skip(app_state, req_payload))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = ContextData::new(LoginCtxData {
    app_state: app_state.get_ref().clone(),
    identifier: payload.identifier,
    password: payload.password,
    user: None,
    token: None,
  });

  match app_state.flows.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx.read();
      match (guard.token.clone(), guard.user.clone()) {
        (Some(token), Some(user)) => Ok(HttpResponse::Ok().json(json!({ "token": token, "user": user }))),
        _ => Err(AppError::Internal("Sign-in completed without a session".to_string())),
      }
    }
    PipelineResult::Stopped => Err(AppError::Internal("Sign-in was halted".to_string())),
  }
}

#[instrument(name = "handler::reset_password", skip(app_state, req_payload))]
pub async fn reset_password_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<ResetPasswordPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let identifier = payload.email_or_mobile.trim();
  if identifier.is_empty() || payload.password.is_empty() || payload.confirm_password.is_empty() {
    return Err(AppError::Validation("All fields are required".to_string()));
  }
  if payload.password != payload.confirm_password {
    return Err(AppError::Validation("Passwords do not match".to_string()));
  }
  if payload.password.len() < auth_service::MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters long",
      auth_service::MIN_PASSWORD_LEN
    )));
  }

  let store = &app_state.store;
  let user = if identifier.contains('@') {
    store.find_user_by_email(&normalize_email(identifier)).await?
  } else {
    store.find_user_by_mobile(identifier).await?
  };
  let mut user = user.ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

  user.password_hash = auth_service::hash_password(&payload.password)?;
  user.updated_at = Utc::now();
  store.update_user(&user).await?;
  info!(user_id = %user.id, "Password reset.");

  Ok(HttpResponse::Ok().json(json!({ "message": "Password reset successful" })))
}
