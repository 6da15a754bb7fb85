// ishop/src/pipelines/register_pipeline.rs

use crate::errors::AppError;
use crate::models::{Role, User};
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::{auth_service, ids};
use chrono::Utc;
use shopflow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use std::sync::Arc;
use tracing::{event, info, warn, Level};
use uuid::Uuid;

pub fn is_valid_mobile(mobile: &str) -> bool {
  mobile.len() == 10 && mobile.bytes().all(|b| b.is_ascii_digit())
}

pub fn normalize_email(email: &str) -> String {
  email.trim().to_lowercase()
}

/// Registers the customer sign-up pipeline.
pub fn register_register_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<RegisterCtxData, AppError>::new(&[
    ("validate_registration", false, None),
    ("check_existing_account", false, None),
    ("create_account", false, None),
  ]);

  p.on_root("validate_registration", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let request = {
        let mut guard = ctx_data.write();
        guard.request.name = guard.request.name.trim().to_string();
        guard.request.email = normalize_email(&guard.request.email);
        guard.request.mobile = guard.request.mobile.trim().to_string();
        guard.request.clone()
      };

      event!(Level::DEBUG, email = %request.email, "Validating registration input.");
      if request.name.is_empty() || request.email.is_empty() || request.mobile.is_empty() || request.password.is_empty()
      {
        return Err(AppError::Validation("All fields are required".to_string()));
      }
      if !request.email.contains('@') {
        return Err(AppError::Validation("Valid email is required".to_string()));
      }
      if !is_valid_mobile(&request.mobile) {
        return Err(AppError::Validation("Mobile number must be 10 digits".to_string()));
      }
      if request.password.len() < auth_service::MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
          "Password must be at least {} characters long",
          auth_service::MIN_PASSWORD_LEN
        )));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("check_existing_account", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let (store, email, mobile) = {
        let guard = ctx_data.read();
        (
          guard.app_state.store.clone(),
          guard.request.email.clone(),
          guard.request.mobile.clone(),
        )
      };

      let email_taken = store.find_user_by_email(&email).await?.is_some();
      let mobile_taken = store.find_user_by_mobile(&mobile).await?.is_some();
      if email_taken || mobile_taken {
        warn!(%email, "Registration attempt with existing email or mobile.");
        return Err(AppError::Validation("User with email or mobile already exists".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("create_account", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let (store, request) = {
        let guard = ctx_data.read();
        (guard.app_state.store.clone(), guard.request.clone())
      };

      let password_hash = auth_service::hash_password(&request.password)?;
      let code = ids::USER.allocate(store.as_ref()).await?;
      let now = Utc::now();
      let user = User {
        id: Uuid::new_v4(),
        code,
        name: request.name,
        email: request.email,
        mobile: request.mobile,
        password_hash,
        role: Role::User,
        addresses: Vec::new(),
        created_at: now,
        updated_at: now,
      };
      store.insert_user(&user).await?;
      info!(user_id = %user.id, "User registered.");

      ctx_data.write().created_user = Some(user);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  tracing::info!("Register pipeline registered.");
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mobile_must_be_ten_digits() {
    assert!(is_valid_mobile("9876543210"));
    assert!(!is_valid_mobile("987654321"));
    assert!(!is_valid_mobile("98765432a0"));
  }

  #[test]
  fn emails_are_trimmed_and_lowercased() {
    assert_eq!(normalize_email("  Ann@Shop.TEST "), "ann@shop.test");
  }
}
