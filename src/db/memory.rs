//! In-memory `Store`, used for development (`db.url = "memory:"`) and tests.
//!
//! Mirrors the Postgres schema: unique usernames, one like per (user, post),
//! and the same cascades on delete.  Data is lost on restart.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::*;
use crate::models::*;
use crate::util::now;

use super::{Store, store::self_follow_error};

#[derive(Default)]
struct State {
  last_id: i32,
  users: BTreeMap<i32, User>,
  // keyed by user id
  profiles: BTreeMap<i32, Profile>,
  // (follower user id, target user id)
  following: BTreeSet<(i32, i32)>,
  posts: BTreeMap<i32, Post>,
  comments: BTreeMap<i32, Comment>,
  likes: BTreeMap<i32, Like>,
}

impl State {
  fn next_id(&mut self) -> i32 {
    self.last_id += 1;
    self.last_id
  }

  fn summarize(&self, viewer: Option<i32>, post: &Post) -> PostSummary {
    let likes = self.likes.values().filter(|l| l.post_id == post.id);
    let mut like_count = 0;
    let mut liked = false;
    for like in likes {
      like_count += 1;
      liked |= Some(like.user_id) == viewer;
    }
    PostSummary {
      post: post.clone(),
      author: self.users.get(&post.author_id)
        .map(|u| u.username.clone())
        .unwrap_or_default(),
      like_count,
      comment_count: self.comments.values().filter(|c| c.post_id == post.id).count() as i64,
      liked,
    }
  }

  fn summaries<'a>(&self, viewer: Option<i32>, posts: impl Iterator<Item = &'a Post>) -> Vec<PostSummary> {
    let mut list: Vec<PostSummary> = posts.map(|p| self.summarize(viewer, p)).collect();
    list.sort_by(|a, b| {
      b.post.created_at.cmp(&a.post.created_at).then(b.post.id.cmp(&a.post.id))
    });
    list
  }

  fn remove_post(&mut self, post_id: i32) {
    self.posts.remove(&post_id);
    self.comments.retain(|_, c| c.post_id != post_id);
    self.likes.retain(|_, l| l.post_id != post_id);
  }
}

#[derive(Default)]
pub struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Default::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, State>> {
    self.state.lock().map_err(|_| {
      log::error!("MemoryStore: state mutex poisoned");
      Error::InternalServerError
    })
  }
}

#[async_trait(?Send)]
impl Store for MemoryStore {
  async fn create_user(&self, user: &NewUser) -> Result<Option<User>> {
    let mut state = self.lock()?;
    if state.users.values().any(|u| u.username == user.username) {
      return Ok(None);
    }
    let created_at = now();
    let user = User {
      id: state.next_id(),
      username: user.username.clone(),
      email: user.email.clone(),
      password: user.password.clone(),
      created_at,
    };
    let profile = Profile {
      id: state.next_id(),
      user_id: user.id,
      created_at,
      ..Default::default()
    };
    state.users.insert(user.id, user.clone());
    state.profiles.insert(user.id, profile);
    Ok(Some(user))
  }

  async fn user_by_id(&self, user_id: i32) -> Result<Option<User>> {
    Ok(self.lock()?.users.get(&user_id).cloned())
  }

  async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
    Ok(self.lock()?.users.values().find(|u| u.username == username).cloned())
  }

  async fn update_password(&self, user_id: i32, password: &str) -> Result<u64> {
    let mut state = self.lock()?;
    match state.users.get_mut(&user_id) {
      Some(user) => {
        user.password = password.to_string();
        Ok(1)
      },
      None => Ok(0),
    }
  }

  async fn delete_user(&self, user_id: i32) -> Result<u64> {
    let mut state = self.lock()?;
    if state.users.remove(&user_id).is_none() {
      return Ok(0);
    }
    state.profiles.remove(&user_id);
    state.following.retain(|&(from, to)| from != user_id && to != user_id);
    let owned: Vec<i32> = state.posts.values()
      .filter(|p| p.author_id == user_id)
      .map(|p| p.id)
      .collect();
    for post_id in owned {
      state.remove_post(post_id);
    }
    state.comments.retain(|_, c| c.author_id != user_id);
    state.likes.retain(|_, l| l.user_id != user_id);
    Ok(1)
  }

  async fn profile_details(&self, user_id: i32) -> Result<Option<ProfileDetails>> {
    let state = self.lock()?;
    let (user, profile) = match (state.users.get(&user_id), state.profiles.get(&user_id)) {
      (Some(user), Some(profile)) => (user, profile),
      _ => return Ok(None),
    };
    Ok(Some(ProfileDetails {
      username: user.username.clone(),
      profile: profile.clone(),
      followers_count: state.following.iter().filter(|&&(_, to)| to == user_id).count() as i64,
      following_count: state.following.iter().filter(|&&(from, _)| from == user_id).count() as i64,
    }))
  }

  async fn update_profile(&self, user_id: i32, changes: &ProfileChanges) -> Result<u64> {
    let mut state = self.lock()?;
    match state.profiles.get_mut(&user_id) {
      Some(profile) => {
        profile.bio = changes.bio.clone();
        profile.location = changes.location.clone();
        profile.website = changes.website.clone();
        Ok(1)
      },
      None => Ok(0),
    }
  }

  async fn is_following(&self, follower_id: i32, target_id: i32) -> Result<bool> {
    Ok(self.lock()?.following.contains(&(follower_id, target_id)))
  }

  async fn toggle_follow(&self, follower_id: i32, target_id: i32) -> Result<Toggled> {
    if follower_id == target_id {
      return Err(self_follow_error());
    }
    let mut state = self.lock()?;
    if state.following.remove(&(follower_id, target_id)) {
      return Ok(Toggled::Removed);
    }
    if !state.profiles.contains_key(&follower_id) || !state.profiles.contains_key(&target_id) {
      return Err(Error::not_found("profile"));
    }
    state.following.insert((follower_id, target_id));
    Ok(Toggled::Added)
  }

  async fn list_posts(&self, viewer: Option<i32>) -> Result<Vec<PostSummary>> {
    let state = self.lock()?;
    Ok(state.summaries(viewer, state.posts.values()))
  }

  async fn posts_by_author(&self, viewer: Option<i32>, author_id: i32) -> Result<Vec<PostSummary>> {
    let state = self.lock()?;
    Ok(state.summaries(viewer, state.posts.values().filter(|p| p.author_id == author_id)))
  }

  async fn post_summary(&self, viewer: Option<i32>, post_id: i32) -> Result<Option<PostSummary>> {
    let state = self.lock()?;
    Ok(state.posts.get(&post_id).map(|p| state.summarize(viewer, p)))
  }

  async fn post_by_id(&self, post_id: i32) -> Result<Option<Post>> {
    Ok(self.lock()?.posts.get(&post_id).cloned())
  }

  async fn owned_post(&self, post_id: i32, author_id: i32) -> Result<Option<Post>> {
    Ok(self.lock()?.posts.get(&post_id).filter(|p| p.author_id == author_id).cloned())
  }

  async fn create_post(&self, author_id: i32, changes: &PostChanges) -> Result<Post> {
    let mut state = self.lock()?;
    if !state.users.contains_key(&author_id) {
      return Err(Error::not_found("author"));
    }
    let created_at = now();
    let post = Post {
      id: state.next_id(),
      author_id,
      title: changes.title.clone(),
      content: changes.content.clone(),
      created_at,
      updated_at: created_at,
    };
    state.posts.insert(post.id, post.clone());
    Ok(post)
  }

  async fn update_post(&self, post_id: i32, author_id: i32, changes: &PostChanges) -> Result<u64> {
    let mut state = self.lock()?;
    match state.posts.get_mut(&post_id).filter(|p| p.author_id == author_id) {
      Some(post) => {
        post.title = changes.title.clone();
        post.content = changes.content.clone();
        post.updated_at = now();
        Ok(1)
      },
      None => Ok(0),
    }
  }

  async fn delete_post(&self, post_id: i32, author_id: i32) -> Result<u64> {
    let mut state = self.lock()?;
    let owned = state.posts.get(&post_id).map_or(false, |p| p.author_id == author_id);
    if !owned {
      return Ok(0);
    }
    state.remove_post(post_id);
    Ok(1)
  }

  async fn comments_for_post(&self, post_id: i32) -> Result<Vec<CommentDetails>> {
    let state = self.lock()?;
    let mut comments: Vec<CommentDetails> = state.comments.values()
      .filter(|c| c.post_id == post_id)
      .map(|c| CommentDetails {
        comment: c.clone(),
        author: state.users.get(&c.author_id)
          .map(|u| u.username.clone())
          .unwrap_or_default(),
      })
      .collect();
    comments.sort_by(|a, b| {
      a.comment.created_at.cmp(&b.comment.created_at).then(a.comment.id.cmp(&b.comment.id))
    });
    Ok(comments)
  }

  async fn create_comment(&self, post_id: i32, author_id: i32, content: &str) -> Result<Comment> {
    let mut state = self.lock()?;
    if !state.posts.contains_key(&post_id) {
      return Err(Error::not_found("post"));
    }
    if !state.users.contains_key(&author_id) {
      return Err(Error::not_found("author"));
    }
    let comment = Comment {
      id: state.next_id(),
      post_id,
      author_id,
      content: content.to_string(),
      created_at: now(),
    };
    state.comments.insert(comment.id, comment.clone());
    Ok(comment)
  }

  async fn toggle_like(&self, user_id: i32, post_id: i32) -> Result<Toggled> {
    let mut state = self.lock()?;
    let existing = state.likes.values()
      .find(|l| l.user_id == user_id && l.post_id == post_id)
      .map(|l| l.id);
    if let Some(like_id) = existing {
      state.likes.remove(&like_id);
      return Ok(Toggled::Removed);
    }
    if !state.posts.contains_key(&post_id) {
      return Err(Error::not_found("post"));
    }
    if !state.users.contains_key(&user_id) {
      return Err(Error::not_found("user"));
    }
    let like = Like {
      id: state.next_id(),
      user_id,
      post_id,
      created_at: now(),
    };
    state.likes.insert(like.id, like);
    Ok(Toggled::Added)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_user(name: &str) -> NewUser {
    NewUser {
      username: name.to_string(),
      email: String::new(),
      password: "hash".to_string(),
    }
  }

  fn changes(title: &str) -> PostChanges {
    PostChanges { title: title.to_string(), content: "body".to_string() }
  }

  #[actix_rt::test]
  async fn duplicate_username() {
    let store = MemoryStore::new();
    assert!(store.create_user(&new_user("alice")).await.unwrap().is_some());
    assert!(store.create_user(&new_user("alice")).await.unwrap().is_none());
    assert!(store.profile_details(1).await.unwrap().is_some());
  }

  #[actix_rt::test]
  async fn like_toggle_is_odd_even() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let post = store.create_post(alice.id, &changes("hi")).await.unwrap();

    assert_eq!(store.toggle_like(alice.id, post.id).await.unwrap(), Toggled::Added);
    let summary = store.post_summary(Some(alice.id), post.id).await.unwrap().unwrap();
    assert_eq!(summary.like_count, 1);
    assert!(summary.liked);

    assert_eq!(store.toggle_like(alice.id, post.id).await.unwrap(), Toggled::Removed);
    let summary = store.post_summary(Some(alice.id), post.id).await.unwrap().unwrap();
    assert_eq!(summary.like_count, 0);
    assert!(!summary.liked);

    assert_eq!(store.toggle_like(alice.id, post.id).await.unwrap(), Toggled::Added);
    let summary = store.post_summary(None, post.id).await.unwrap().unwrap();
    assert_eq!(summary.like_count, 1);
    assert!(!summary.liked);
  }

  #[actix_rt::test]
  async fn ownership_scoped_mutation() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let bob = store.create_user(&new_user("bob")).await.unwrap().unwrap();
    let post = store.create_post(alice.id, &changes("mine")).await.unwrap();

    assert!(store.owned_post(post.id, bob.id).await.unwrap().is_none());
    assert_eq!(store.update_post(post.id, bob.id, &changes("stolen")).await.unwrap(), 0);
    assert_eq!(store.delete_post(post.id, bob.id).await.unwrap(), 0);
    assert_eq!(store.post_by_id(post.id).await.unwrap().unwrap().title, "mine");

    assert_eq!(store.update_post(post.id, alice.id, &changes("edited")).await.unwrap(), 1);
    assert_eq!(store.owned_post(post.id, alice.id).await.unwrap().unwrap().title, "edited");
  }

  #[actix_rt::test]
  async fn follow_toggle() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let bob = store.create_user(&new_user("bob")).await.unwrap().unwrap();

    assert!(store.toggle_follow(alice.id, alice.id).await.is_err());
    assert!(!store.is_following(alice.id, alice.id).await.unwrap());

    assert_eq!(store.toggle_follow(alice.id, bob.id).await.unwrap(), Toggled::Added);
    assert!(store.is_following(alice.id, bob.id).await.unwrap());
    assert!(!store.is_following(bob.id, alice.id).await.unwrap());
    let details = store.profile_details(bob.id).await.unwrap().unwrap();
    assert_eq!((details.followers_count, details.following_count), (1, 0));

    assert_eq!(store.toggle_follow(alice.id, bob.id).await.unwrap(), Toggled::Removed);
    assert!(!store.is_following(alice.id, bob.id).await.unwrap());
  }

  #[actix_rt::test]
  async fn ordering() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let first = store.create_post(alice.id, &changes("first")).await.unwrap();
    let second = store.create_post(alice.id, &changes("second")).await.unwrap();
    let posts = store.list_posts(None).await.unwrap();
    assert_eq!(posts.iter().map(|p| p.post.id).collect::<Vec<_>>(), vec![second.id, first.id]);

    let c1 = store.create_comment(first.id, alice.id, "one").await.unwrap();
    let c2 = store.create_comment(first.id, alice.id, "two").await.unwrap();
    let comments = store.comments_for_post(first.id).await.unwrap();
    assert_eq!(comments.iter().map(|c| c.comment.id).collect::<Vec<_>>(), vec![c1.id, c2.id]);
    assert_eq!(comments[0].author, "alice");
  }

  #[actix_rt::test]
  async fn delete_user_cascades() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let bob = store.create_user(&new_user("bob")).await.unwrap().unwrap();
    let alice_post = store.create_post(alice.id, &changes("alice's")).await.unwrap();
    let bob_post = store.create_post(bob.id, &changes("bob's")).await.unwrap();
    store.create_comment(alice_post.id, bob.id, "hi").await.unwrap();
    store.create_comment(bob_post.id, alice.id, "hey").await.unwrap();
    store.toggle_like(bob.id, alice_post.id).await.unwrap();
    store.toggle_like(alice.id, bob_post.id).await.unwrap();
    store.toggle_follow(bob.id, alice.id).await.unwrap();

    assert_eq!(store.delete_user(bob.id).await.unwrap(), 1);

    assert!(store.user_by_username("bob").await.unwrap().is_none());
    assert!(store.post_by_id(bob_post.id).await.unwrap().is_none());
    let posts = store.list_posts(None).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].like_count, 0);
    assert_eq!(posts[0].comment_count, 0);
    let details = store.profile_details(alice.id).await.unwrap().unwrap();
    assert_eq!(details.followers_count, 0);
    let state = store.lock().unwrap();
    assert!(state.comments.is_empty());
    assert!(state.likes.is_empty());
  }

  #[actix_rt::test]
  async fn rows_need_an_existing_user() {
    let store = MemoryStore::new();
    let alice = store.create_user(&new_user("alice")).await.unwrap().unwrap();
    let bob = store.create_user(&new_user("bob")).await.unwrap().unwrap();
    let post = store.create_post(alice.id, &changes("hello")).await.unwrap();
    store.delete_user(bob.id).await.unwrap();

    assert!(store.create_post(bob.id, &changes("ghost")).await.is_err());
    assert!(store.create_comment(post.id, bob.id, "boo").await.is_err());
    assert!(store.toggle_like(bob.id, post.id).await.is_err());
    assert!(store.toggle_follow(bob.id, alice.id).await.is_err());

    assert!(store.comments_for_post(post.id).await.unwrap().is_empty());
    assert_eq!(store.post_summary(None, post.id).await.unwrap().unwrap().like_count, 0);
  }
}
