use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
  pub id: i32,
  pub author_id: i32,
  pub title: String,
  pub content: String,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

/// A post as shown in listings, with author and counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostSummary {
  pub post: Post,
  pub author: String,
  pub like_count: i64,
  pub comment_count: i64,
  /// Liked by the viewing user.
  pub liked: bool,
}

/// Title and content of a post to store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostChanges {
  pub title: String,
  pub content: String,
}
