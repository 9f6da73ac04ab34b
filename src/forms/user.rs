use serde::{Deserialize, Serialize};

use super::*;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const INVALID_LOGIN: &str = "Please enter a correct username and password. \
  Note that both fields may be case-sensitive.";

const COMMON_PASSWORDS: &[&str] = &[
  "password", "password1", "password12", "password123", "passw0rd",
  "12345678", "123456789", "1234567890", "87654321", "11111111",
  "qwertyuiop", "qwerty123", "iloveyou", "sunshine", "princess",
  "football", "baseball", "welcome1", "abc12345", "letmein1",
  "trustno1", "superman", "starwars", "whatever", "dragon12",
  "monkey12", "access14", "master12", "shadow12", "michael1",
];

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegisterForm {
  pub username: String,
  pub email: String,
  pub password1: String,
  pub password2: String,
}

/// Cleaned registration data.  `password` is still plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
  pub username: String,
  pub email: String,
  pub password: String,
}

impl RegisterForm {
  pub fn validate(&self) -> Result<Registration, FormErrors> {
    self.validate_with(false)
  }

  /// Cleaned username, the key to check for uniqueness before `validate_with`.
  pub fn cleaned_username(&self) -> String {
    clean(&self.username)
  }

  /// `username_taken` is reported next to the other field errors.
  pub fn validate_with(&self, username_taken: bool) -> Result<Registration, FormErrors> {
    let mut errors = FormErrors::new();
    let username = clean(&self.username);
    let email = clean(&self.email);

    check_required(&mut errors, "username", &username);
    check_max_len(&mut errors, "username", &username, USERNAME_MAX_LEN);
    if !username.chars().all(is_username_char) {
      errors.add("username", "Enter a valid username. This value may contain only \
        letters, numbers, and @/./+/-/_ characters.");
    }
    if username_taken {
      errors.add("username", USERNAME_TAKEN);
    }

    if !email.is_empty() {
      check_max_len(&mut errors, "email", &email, EMAIL_MAX_LEN);
      if !is_valid_email(&email) {
        errors.add("email", "Enter a valid email address.");
      }
    }

    check_required(&mut errors, "password1", &self.password1);
    check_required(&mut errors, "password2", &self.password2);
    if !self.password1.is_empty() && !self.password2.is_empty() {
      if self.password1 != self.password2 {
        errors.add("password2", "The two password fields didn’t match.");
      } else {
        for message in password_problems(&self.password1, &username) {
          errors.add("password2", message);
        }
      }
    }

    errors.finish(Registration {
      username,
      email,
      password: self.password1.clone(),
    })
  }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

impl LoginForm {
  /// Returns the cleaned `(username, password)` pair.
  pub fn validate(&self) -> Result<(String, String), FormErrors> {
    let mut errors = FormErrors::new();
    let username = clean(&self.username);
    check_required(&mut errors, "username", &username);
    check_required(&mut errors, "password", &self.password);
    errors.finish((username, self.password.clone()))
  }
}

fn is_username_char(c: char) -> bool {
  c.is_alphanumeric() || "@.+-_".contains(c)
}

pub fn is_valid_email(email: &str) -> bool {
  if email.chars().any(char::is_whitespace) {
    return false;
  }
  let mut parts = email.splitn(2, '@');
  let local = parts.next().unwrap_or_default();
  let domain = match parts.next() {
    Some(domain) => domain,
    None => return false,
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  let labels: Vec<&str> = domain.split('.').collect();
  labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Password strength checks, applied after both fields matched.
pub fn password_problems(password: &str, username: &str) -> Vec<&'static str> {
  let mut problems = Vec::new();
  let lower = password.to_lowercase();
  let user = username.to_lowercase();
  if user.chars().count() >= 3 && (lower.contains(&user) || user.contains(&lower)) {
    problems.push("The password is too similar to the username.");
  }
  if password.chars().count() < PASSWORD_MIN_LEN {
    problems.push("This password is too short. It must contain at least 8 characters.");
  }
  if COMMON_PASSWORDS.contains(&lower.as_str()) {
    problems.push("This password is too common.");
  }
  if password.chars().all(|c| c.is_ascii_digit()) {
    problems.push("This password is entirely numeric.");
  }
  problems
}
