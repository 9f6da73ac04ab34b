use std::sync::Arc;

use async_trait::async_trait;

use actix_web::web;

use crate::error::*;
use crate::models::*;

use super::{DbService, MemoryStore};

/// Persistence operations used by the request handlers.
///
/// Every `viewer` argument is the signed-in user, if any, and only affects
/// the per-viewer `liked` flag of `PostSummary`.
#[async_trait(?Send)]
pub trait Store {
  /// Creates the user and an empty profile.  `None` when the username is taken.
  async fn create_user(&self, user: &NewUser) -> Result<Option<User>>;
  async fn user_by_id(&self, user_id: i32) -> Result<Option<User>>;
  async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
  async fn update_password(&self, user_id: i32, password: &str) -> Result<u64>;
  /// Deletes the user along with everything they own or take part in.
  async fn delete_user(&self, user_id: i32) -> Result<u64>;

  async fn profile_details(&self, user_id: i32) -> Result<Option<ProfileDetails>>;
  async fn update_profile(&self, user_id: i32, changes: &ProfileChanges) -> Result<u64>;
  async fn is_following(&self, follower_id: i32, target_id: i32) -> Result<bool>;
  /// Adds or removes the follower -> target edge.  Self-follow is an error.
  async fn toggle_follow(&self, follower_id: i32, target_id: i32) -> Result<Toggled>;

  async fn list_posts(&self, viewer: Option<i32>) -> Result<Vec<PostSummary>>;
  async fn posts_by_author(&self, viewer: Option<i32>, author_id: i32) -> Result<Vec<PostSummary>>;
  async fn post_summary(&self, viewer: Option<i32>, post_id: i32) -> Result<Option<PostSummary>>;
  async fn post_by_id(&self, post_id: i32) -> Result<Option<Post>>;
  /// Ownership-scoped lookup: `None` unless `author_id` wrote the post.
  async fn owned_post(&self, post_id: i32, author_id: i32) -> Result<Option<Post>>;
  async fn create_post(&self, author_id: i32, changes: &PostChanges) -> Result<Post>;
  async fn update_post(&self, post_id: i32, author_id: i32, changes: &PostChanges) -> Result<u64>;
  async fn delete_post(&self, post_id: i32, author_id: i32) -> Result<u64>;

  /// Oldest first.
  async fn comments_for_post(&self, post_id: i32) -> Result<Vec<CommentDetails>>;
  async fn create_comment(&self, post_id: i32, author_id: i32, content: &str) -> Result<Comment>;

  async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<Toggled>;
}

pub(crate) fn self_follow_error() -> Error {
  Error::BadRequest("You cannot follow yourself.".to_string())
}

#[async_trait(?Send)]
impl Store for DbService {
  async fn create_user(&self, user: &NewUser) -> Result<Option<User>> {
    self.user.store(user).await
  }

  async fn user_by_id(&self, user_id: i32) -> Result<Option<User>> {
    self.user.get_by_id(user_id).await
  }

  async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
    self.user.get_by_username(username).await
  }

  async fn update_password(&self, user_id: i32, password: &str) -> Result<u64> {
    self.user.update_password(user_id, password).await
  }

  async fn delete_user(&self, user_id: i32) -> Result<u64> {
    self.user.delete(user_id).await
  }

  async fn profile_details(&self, user_id: i32) -> Result<Option<ProfileDetails>> {
    self.profile.get_details(user_id).await
  }

  async fn update_profile(&self, user_id: i32, changes: &ProfileChanges) -> Result<u64> {
    self.profile.update(user_id, changes).await
  }

  async fn is_following(&self, follower_id: i32, target_id: i32) -> Result<bool> {
    self.profile.is_following(follower_id, target_id).await
  }

  async fn toggle_follow(&self, follower_id: i32, target_id: i32) -> Result<Toggled> {
    if follower_id == target_id {
      return Err(self_follow_error());
    }
    if self.profile.unfollow(follower_id, target_id).await? > 0 {
      return Ok(Toggled::Removed);
    }
    self.profile.follow(follower_id, target_id).await?;
    Ok(Toggled::Added)
  }

  async fn list_posts(&self, viewer: Option<i32>) -> Result<Vec<PostSummary>> {
    self.post.get_posts(viewer).await
  }

  async fn posts_by_author(&self, viewer: Option<i32>, author_id: i32) -> Result<Vec<PostSummary>> {
    self.post.get_by_author(viewer, author_id).await
  }

  async fn post_summary(&self, viewer: Option<i32>, post_id: i32) -> Result<Option<PostSummary>> {
    self.post.get_summary(viewer, post_id).await
  }

  async fn post_by_id(&self, post_id: i32) -> Result<Option<Post>> {
    self.post.get_by_id(post_id).await
  }

  async fn owned_post(&self, post_id: i32, author_id: i32) -> Result<Option<Post>> {
    self.post.get_owned(post_id, author_id).await
  }

  async fn create_post(&self, author_id: i32, changes: &PostChanges) -> Result<Post> {
    self.post.store(author_id, changes).await
  }

  async fn update_post(&self, post_id: i32, author_id: i32, changes: &PostChanges) -> Result<u64> {
    self.post.update(post_id, author_id, changes).await
  }

  async fn delete_post(&self, post_id: i32, author_id: i32) -> Result<u64> {
    self.post.delete(post_id, author_id).await
  }

  async fn comments_for_post(&self, post_id: i32) -> Result<Vec<CommentDetails>> {
    self.comment.get_by_post(post_id).await
  }

  async fn create_comment(&self, post_id: i32, author_id: i32, content: &str) -> Result<Comment> {
    self.comment.store(post_id, author_id, content).await
  }

  async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<Toggled> {
    if self.like.unlike(user_id, post_id).await? > 0 {
      return Ok(Toggled::Removed);
    }
    self.like.like(user_id, post_id).await?;
    Ok(Toggled::Added)
  }
}

/// Which `Store` backs the web workers, picked from `db.url`.
#[derive(Clone)]
pub enum StoreConfig {
  /// `postgres://...`; each worker opens its own connection.
  Postgres(String),
  /// `memory:`; one store shared by all workers.
  Memory(Arc<MemoryStore>),
}

impl StoreConfig {
  pub fn from_url(db_url: &str) -> Self {
    if db_url.starts_with("memory:") {
      StoreConfig::Memory(Arc::new(MemoryStore::new()))
    } else {
      StoreConfig::Postgres(db_url.to_string())
    }
  }

  /// Build the store handed to one worker's handlers.
  pub fn worker_store(&self) -> web::Data<dyn Store> {
    let store: Arc<dyn Store> = match self {
      StoreConfig::Postgres(url) => Arc::new(DbService::new(url)),
      StoreConfig::Memory(store) => store.clone(),
    };
    web::Data::from(store)
  }
}
