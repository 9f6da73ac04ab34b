use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
  pub id: i32,
  pub user_id: i32,
  pub post_id: i32,
  pub created_at: NaiveDateTime,
}

/// Result of a toggle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
  Added,
  Removed,
}
