use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
  pub id: i32,
  pub post_id: i32,
  pub author_id: i32,
  pub content: String,
  pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentDetails {
  pub comment: Comment,
  pub author: String,
}
