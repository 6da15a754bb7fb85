// ishop/src/pipelines/login_pipeline.rs

use crate::errors::AppError;
use crate::pipelines::contexts::LoginCtxData;
use crate::pipelines::register_pipeline::normalize_email;
use crate::services::auth_service;
use shopflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{info, warn};

fn invalid_credentials() -> AppError {
  AppError::Validation("Invalid credentials".to_string())
}

/// Registers the sign-in pipeline. Unknown accounts and wrong passwords get
/// the same answer.
pub fn register_login_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<LoginCtxData, AppError>::new(&[
    ("validate_login_input", false, None),
    ("find_account", false, None),
    ("verify_credentials", false, None),
    ("issue_session_token", false, None),
  ]);

  p.on_root("validate_login_input", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (identifier, has_password) = {
        let mut guard = ctx_data.write();
        guard.identifier = guard.identifier.trim().to_string();
        (guard.identifier.clone(), !guard.password.is_empty())
      };
      if identifier.is_empty() || !has_password {
        return Err(AppError::Validation("Identifier and password are required".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("find_account", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (store, identifier) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.identifier.clone())
      };

      let user = if identifier.contains('@') {
        store.find_user_by_email(&normalize_email(&identifier)).await?
      } else {
        store.find_user_by_mobile(&identifier).await?
      };
      let Some(user) = user else {
        warn!("Sign-in attempt for unknown account.");
        return Err(invalid_credentials());
      };

      ctx_data.write().user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("verify_credentials", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (hash, password) = {
        let guard = ctx_data.read();
        let hash = guard.user.as_ref().map(|u| u.password_hash.clone()).unwrap_or_default();
        (hash, guard.password.clone())
      };

      if !auth_service::verify_password(&hash, &password)? {
        warn!("Sign-in attempt with wrong password.");
        return Err(invalid_credentials());
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("issue_session_token", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (user, config) = {
        let guard = ctx_data.read();
        (guard.user.clone(), guard.app_state.config.clone())
      };
      let user = user.ok_or_else(|| AppError::Internal("Account missing after verification".to_string()))?;

      let token = auth_service::issue_token(user.id, user.role, &config.jwt_secret, config.jwt_ttl_hours)?;
      info!(user_id = %user.id, "Session token issued.");
      ctx_data.write().token = Some(token);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Login pipeline registered.");
}
