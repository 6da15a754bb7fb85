// ishop/src/web/handlers/user_handlers.rs

use crate::errors::AppError;
use crate::models::{Address, Role, User};
use crate::pipelines::register_pipeline::{is_valid_mobile, normalize_email};
use crate::services::auth_service;
use crate::state::AppState;
use crate::store::Store;
use crate::web::extractors::{AdminUser, AuthenticatedUser};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
  pub id: Option<Uuid>,
  #[serde(default)]
  pub label: String,
  #[serde(default)]
  pub address_line: String,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub state: String,
  #[serde(default)]
  pub pincode: String,
  #[serde(default)]
  pub mobile: String,
}

impl AddressPayload {
  fn into_address(self) -> Address {
    Address {
      id: self.id.unwrap_or_else(Uuid::new_v4),
      label: self.label,
      address_line: self.address_line,
      city: self.city,
      state: self.state,
      pincode: self.pincode,
      mobile: self.mobile,
    }
  }
}

/// Address edit: absent fields keep their value.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
  pub label: Option<String>,
  pub address_line: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub pincode: Option<String>,
  pub mobile: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct AccountPatch {
  pub name: Option<String>,
  pub mobile: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct AdminUserPatch {
  pub name: Option<String>,
  pub email: Option<String>,
  pub role: Option<Role>,
  pub mobile: Option<String>,
  pub addresses: Option<Vec<AddressPayload>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetPayload {
  #[serde(default)]
  pub new_password: String,
}

fn user_not_found() -> AppError {
  AppError::NotFound("User not found".to_string())
}

async fn load_user(store: &dyn Store, id: Uuid) -> Result<User, AppError> {
  store.get_user(id).await?.ok_or_else(user_not_found)
}

async fn save_user(store: &dyn Store, user: &mut User) -> Result<(), AppError> {
  user.updated_at = Utc::now();
  if !store.update_user(user).await? {
    return Err(user_not_found());
  }
  Ok(())
}

/// Rejects a mobile that is malformed or already used by a different account.
async fn check_mobile(store: &dyn Store, user_id: Uuid, mobile: &str) -> Result<(), AppError> {
  if !is_valid_mobile(mobile) {
    return Err(AppError::Validation("Mobile number must be 10 digits".to_string()));
  }
  if let Some(other) = store.find_user_by_mobile(mobile).await? {
    if other.id != user_id {
      return Err(AppError::Validation("Mobile number already in use".to_string()));
    }
  }
  Ok(())
}

#[instrument(name = "handler::list_users", skip(app_state, _admin))]
pub async fn list_users_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.store.list_users().await?))
}

#[instrument(name = "handler::get_user", skip(app_state, auth_user))]
pub async fn get_user_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.ensure_self_or_admin(user_id)?;
  Ok(HttpResponse::Ok().json(load_user(app_state.store.as_ref(), user_id).await?))
}

#[instrument(name = "handler::update_account", skip(app_state, auth_user, req_payload))]
pub async fn update_account_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<AccountPatch>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.ensure_self_or_admin(user_id)?;
  let store = app_state.store.as_ref();
  let mut user = load_user(store, user_id).await?;
  let patch = req_payload.into_inner();

  if let Some(name) = patch.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
    user.name = name;
  }
  if let Some(mobile) = patch.mobile.map(|m| m.trim().to_string()) {
    check_mobile(store, user.id, &mobile).await?;
    user.mobile = mobile;
  }
  save_user(store, &mut user).await?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::admin_update_user", skip(app_state, _admin, req_payload))]
pub async fn admin_update_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<AdminUserPatch>,
) -> Result<HttpResponse, AppError> {
  let store = app_state.store.as_ref();
  let mut user = load_user(store, path.into_inner()).await?;
  let patch = req_payload.into_inner();

  if let Some(name) = patch.name.filter(|n| !n.trim().is_empty()) {
    user.name = name.trim().to_string();
  }
  if let Some(email) = patch.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()) {
    if let Some(other) = store.find_user_by_email(&email).await? {
      if other.id != user.id {
        return Err(AppError::Validation("Email already in use".to_string()));
      }
    }
    user.email = email;
  }
  if let Some(role) = patch.role {
    user.role = role;
  }
  if let Some(mobile) = patch.mobile.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()) {
    check_mobile(store, user.id, &mobile).await?;
    user.mobile = mobile;
  }
  if let Some(addresses) = patch.addresses {
    user.addresses = addresses.into_iter().map(AddressPayload::into_address).collect();
  }
  save_user(store, &mut user).await?;
  info!(user_id = %user.id, "User updated by admin.");
  Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully" })))
}

#[instrument(name = "handler::delete_user", skip(app_state, _admin))]
pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_user(path.into_inner()).await? {
    return Err(user_not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "User deleted" })))
}

#[instrument(name = "handler::admin_reset_password", skip(app_state, _admin, req_payload))]
pub async fn admin_reset_password_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<AdminResetPayload>,
) -> Result<HttpResponse, AppError> {
  let new_password = req_payload.into_inner().new_password;
  if new_password.is_empty() {
    return Err(AppError::Validation("New password is required".to_string()));
  }
  let store = app_state.store.as_ref();
  let mut user = load_user(store, path.into_inner()).await?;
  user.password_hash = auth_service::hash_password(&new_password)?;
  save_user(store, &mut user).await?;
  Ok(HttpResponse::Ok().json(json!({ "message": "Password reset successfully" })))
}

#[instrument(name = "handler::add_address", skip(app_state, auth_user, req_payload))]
pub async fn add_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
  req_payload: web::Json<AddressPayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  auth_user.ensure_self_or_admin(user_id)?;
  let store = app_state.store.as_ref();
  let mut user = load_user(store, user_id).await?;

  let mut payload = req_payload.into_inner();
  payload.id = None;
  user.addresses.push(payload.into_address());
  save_user(store, &mut user).await?;
  Ok(HttpResponse::Ok().json(user.addresses))
}

#[instrument(name = "handler::update_address", skip(app_state, auth_user, req_payload))]
pub async fn update_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<(Uuid, Uuid)>,
  req_payload: web::Json<AddressPatch>,
) -> Result<HttpResponse, AppError> {
  let (user_id, address_id) = path.into_inner();
  auth_user.ensure_self_or_admin(user_id)?;
  let store = app_state.store.as_ref();
  let mut user = load_user(store, user_id).await?;

  let address = user
    .addresses
    .iter_mut()
    .find(|a| a.id == address_id)
    .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;
  let patch = req_payload.into_inner();
  if let Some(label) = patch.label {
    address.label = label;
  }
  if let Some(line) = patch.address_line {
    address.address_line = line;
  }
  if let Some(city) = patch.city {
    address.city = city;
  }
  if let Some(state) = patch.state {
    address.state = state;
  }
  if let Some(pincode) = patch.pincode {
    address.pincode = pincode;
  }
  if let Some(mobile) = patch.mobile {
    address.mobile = mobile;
  }
  save_user(store, &mut user).await?;
  Ok(HttpResponse::Ok().json(user.addresses))
}

#[instrument(name = "handler::delete_address", skip(app_state, auth_user))]
pub async fn delete_address_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
  let (user_id, address_id) = path.into_inner();
  auth_user.ensure_self_or_admin(user_id)?;
  let store = app_state.store.as_ref();
  let mut user = load_user(store, user_id).await?;

  let before = user.addresses.len();
  user.addresses.retain(|a| a.id != address_id);
  if user.addresses.len() == before {
    return Err(AppError::NotFound("Address not found".to_string()));
  }
  save_user(store, &mut user).await?;
  Ok(HttpResponse::Ok().json(user.addresses))
}
