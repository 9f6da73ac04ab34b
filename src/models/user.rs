use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
  pub id: i32,
  pub username: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password: String,
  pub created_at: NaiveDateTime,
}

/// A user row ready to be inserted.  `password` is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
  pub username: String,
  pub email: String,
  pub password: String,
}
