use serde::{Deserialize, Serialize};

use crate::models::PostChanges;

use super::*;

pub const TITLE_MAX_LEN: usize = 150;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostForm {
  pub title: String,
  pub content: String,
}

impl PostForm {
  pub fn validate(&self) -> Result<PostChanges, FormErrors> {
    let mut errors = FormErrors::new();
    let title = clean(&self.title);
    let content = clean(&self.content);
    check_required(&mut errors, "title", &title);
    check_max_len(&mut errors, "title", &title, TITLE_MAX_LEN);
    check_required(&mut errors, "content", &content);
    errors.finish(PostChanges { title, content })
  }
}

impl From<&crate::models::Post> for PostForm {
  fn from(post: &crate::models::Post) -> Self {
    Self {
      title: post.title.clone(),
      content: post.content.clone(),
    }
  }
}

/// Like toggle form.  `next` is where to return afterwards.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LikeForm {
  pub next: Option<String>,
}
