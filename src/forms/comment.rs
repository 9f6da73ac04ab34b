use serde::{Deserialize, Serialize};

use super::*;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommentForm {
  pub content: String,
}

impl CommentForm {
  pub fn validate(&self) -> Result<String, FormErrors> {
    let mut errors = FormErrors::new();
    let content = clean(&self.content);
    check_required(&mut errors, "content", &content);
    errors.finish(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn comment_content() {
    assert_eq!(CommentForm { content: " nice post ".into() }.validate().unwrap(), "nice post");
    let errors = CommentForm { content: "\n\t".into() }.validate().unwrap_err();
    assert_eq!(errors.field("content"), &[REQUIRED.to_string()]);
  }
}
