// ishop/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "user_role_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
  pub id: Uuid,
  pub label: String,
  pub address_line: String,
  pub city: String,
  pub state: String,
  pub pincode: String,
  pub mobile: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: Uuid,
  #[serde(rename = "userId")]
  pub code: String,
  pub name: String,
  pub email: String,
  pub mobile: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: Role,
  #[sqlx(json)]
  pub addresses: Vec<Address>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
