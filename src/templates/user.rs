use maud::{html, Markup};

use crate::forms::{FormErrors, LoginForm, RegisterForm};

use super::{input_field, non_field_errors};

pub fn register(form: &RegisterForm, errors: &FormErrors) -> Markup {
  html! {
    div class="card" {
      h1 { "Create an account" }
      form method="post" action="/register/" {
        (non_field_errors(errors))
        (input_field("Username", "username", "text", &form.username, errors))
        (input_field("Email (optional)", "email", "email", &form.email, errors))
        (input_field("Password", "password1", "password", "", errors))
        (input_field("Confirm password", "password2", "password", "", errors))
        button type="submit" { "Register" }
      }
      p class="meta" { "Already registered? " a href="/login/" { "Sign in" } }
    }
  }
}

pub fn login(form: &LoginForm, errors: &FormErrors) -> Markup {
  html! {
    div class="card" {
      h1 { "Sign in" }
      form method="post" action="/login/" {
        (non_field_errors(errors))
        (input_field("Username", "username", "text", &form.username, errors))
        (input_field("Password", "password", "password", "", errors))
        button type="submit" { "Sign in" }
      }
      p class="meta" { "New here? " a href="/register/" { "Create an account" } }
    }
  }
}
