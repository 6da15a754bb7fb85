// ishop/src/services/seed.rs

use crate::config::AdminSeed;
use crate::errors::Result;
use crate::models::{Role, User};
use crate::services::{auth_service, ids};
use crate::store::Store;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Creates the configured admin account unless its email is already taken.
/// Returns whether an account was created.
#[instrument(name = "seed::ensure_admin", skip(store, seed), fields(email = %seed.email))]
pub async fn ensure_admin(store: &dyn Store, seed: &AdminSeed) -> Result<bool> {
  let email = seed.email.trim().to_lowercase();
  if store.find_user_by_email(&email).await?.is_some() {
    info!("Admin account already present, skipping seed.");
    return Ok(false);
  }

  let password_hash = auth_service::hash_password(&seed.password)?;
  let code = ids::USER.allocate(store).await?;
  let now = Utc::now();
  let admin = User {
    id: Uuid::new_v4(),
    code,
    name: "Administrator".to_string(),
    email,
    mobile: seed.mobile.clone(),
    password_hash,
    role: Role::Admin,
    addresses: Vec::new(),
    created_at: now,
    updated_at: now,
  };
  store.insert_user(&admin).await?;
  info!(user_id = %admin.id, "Seeded admin account.");
  Ok(true)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  #[tokio::test]
  async fn seeds_once() {
    let store = MemoryStore::new();
    let seed = AdminSeed {
      email: " Admin@Shop.test ".to_string(),
      password: "admin123".to_string(),
      mobile: "9000000000".to_string(),
    };
    assert!(ensure_admin(&store, &seed).await.unwrap());
    assert!(!ensure_admin(&store, &seed).await.unwrap());

    let admin = store.find_user_by_email("admin@shop.test").await.unwrap().unwrap();
    assert!(admin.is_admin());
    assert!(admin.code.starts_with("USR-"));
  }
}
