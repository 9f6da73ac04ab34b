use std::collections::BTreeMap;

pub mod user;
pub mod post;
pub mod comment;
pub mod profile;

pub use self::{
  user::*,
  post::*,
  comment::*,
  profile::*,
};

pub const REQUIRED: &str = "This field is required.";

/// Field-level and form-level validation messages.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors {
  fields: BTreeMap<&'static str, Vec<String>>,
  non_field: Vec<String>,
}

impl FormErrors {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.fields.entry(field).or_default().push(message.into());
  }

  pub fn add_non_field(&mut self, message: impl Into<String>) {
    self.non_field.push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty() && self.non_field.is_empty()
  }

  pub fn field(&self, field: &str) -> &[String] {
    self.fields.get(field).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn non_field(&self) -> &[String] {
    &self.non_field
  }

  /// `Ok(value)` when no errors were recorded.
  pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
    if self.is_empty() {
      Ok(value)
    } else {
      Err(self)
    }
  }
}

/// Trim a text input.
pub(crate) fn clean(value: &str) -> String {
  value.trim().to_string()
}

pub(crate) fn check_required(errors: &mut FormErrors, field: &'static str, value: &str) {
  if value.is_empty() {
    errors.add(field, REQUIRED);
  }
}

pub(crate) fn check_max_len(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) {
  let len = value.chars().count();
  if len > max {
    errors.add(field, format!(
      "Ensure this value has at most {} characters (it has {}).", max, len));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn finish_with_errors() {
    let mut errors = FormErrors::new();
    assert!(errors.clone().finish(1).is_ok());
    errors.add("title", REQUIRED);
    errors.add("title", "again");
    assert_eq!(errors.field("title").len(), 2);
    assert!(errors.field("content").is_empty());
    assert!(errors.finish(1).is_err());
  }

  #[test]
  fn max_len_counts_chars() {
    let mut errors = FormErrors::new();
    check_max_len(&mut errors, "title", "ééé", 3);
    assert!(errors.is_empty());
    check_max_len(&mut errors, "title", "éééé", 3);
    assert_eq!(errors.field("title"),
      &["Ensure this value has at most 3 characters (it has 4).".to_string()]);
  }
}
