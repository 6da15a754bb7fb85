// ishop/src/web/extractors.rs

use crate::errors::AppError;
use crate::models::Role;
use crate::services::auth_service;
use crate::state::AppState;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

/// Caller identified by a valid `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: Role,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Passes for the account owner and for admins.
  pub fn ensure_self_or_admin(&self, user_id: Uuid) -> Result<(), AppError> {
    if self.is_admin() || self.user_id == user_id {
      Ok(())
    } else {
      Err(AppError::Forbidden("Access denied".to_string()))
    }
  }
}

/// An `AuthenticatedUser` whose role is `admin`.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(actix_web::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))?;
  let token = bearer_token(req).ok_or_else(|| {
    warn!(path = %req.path(), "Request without bearer token.");
    AppError::Auth("Not authorized, no token".to_string())
  })?;
  let claims = auth_service::decode_token(token, &state.config.jwt_secret)?;
  Ok(AuthenticatedUser {
    user_id: claims.sub,
    role: claims.role,
  })
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(authenticate(req).and_then(|user| {
      if user.is_admin() {
        Ok(AdminUser(user))
      } else {
        warn!(user_id = %user.user_id, path = %req.path(), "Non-admin hit an admin route.");
        Err(AppError::Forbidden("Admin access required".to_string()))
      }
    }))
  }
}
