//! Server-rendered HTML pages.
//!
//! Built with [maud](https://maud.lambda.xyz/); every dynamic value is escaped.

use actix_web::http::StatusCode;

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::auth::{AuthData, Flash, FlashLevel};
use crate::forms::FormErrors;

pub mod post;
pub mod user;
pub mod profile;

const SITE_NAME: &str = "Blogsite";

const PAGE_CSS: &str = r#"
*{box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.6;color:#1d1d1f;background:#f6f6f4;margin:0}
header{background:#fff;border-bottom:1px solid #e4e4e0}
nav{max-width:760px;margin:0 auto;padding:.75rem 1rem;display:flex;gap:1rem;align-items:center}
nav .brand{font-weight:700;margin-right:auto}
nav form{margin:0}
main{max-width:760px;margin:1.5rem auto;padding:0 1rem}
a{color:#2b59c3;text-decoration:none}
a:hover{text-decoration:underline}
.card{background:#fff;border:1px solid #e4e4e0;border-radius:8px;padding:1.25rem;margin-bottom:1rem}
.meta{color:#777;font-size:.9rem}
.content{white-space:pre-wrap;word-break:break-word}
.actions{display:flex;gap:.75rem;align-items:center;margin-top:.75rem}
.actions form{margin:0}
.flash{padding:.6rem 1rem;border-radius:6px;margin-bottom:.75rem}
.flash-success{background:#e6f4ea}
.flash-info{background:#e8f0fe}
.flash-error{background:#fce8e6}
.field{margin:0 0 1rem}
.field label{display:block;font-weight:600;margin-bottom:.25rem}
.field input,.field textarea{width:100%;padding:.5rem;border:1px solid #ccc;border-radius:6px;font:inherit}
.error{display:block;color:#b3261e;font-size:.9rem}
button,.button{background:#2b59c3;color:#fff;border:0;border-radius:6px;padding:.45rem .9rem;font:inherit;cursor:pointer}
button.link{background:none;color:#2b59c3;padding:0}
button.danger{background:#b3261e}
.comment{border-top:1px solid #eee;padding:.75rem 0}
"#;

fn flash_class(level: FlashLevel) -> &'static str {
  match level {
    FlashLevel::Success => "flash flash-success",
    FlashLevel::Info => "flash flash-info",
    FlashLevel::Error => "flash flash-error",
  }
}

fn head(title: &str) -> Markup {
  html! {
    head {
      meta charset="utf-8";
      meta name="viewport" content="width=device-width, initial-scale=1";
      title { (title) " · " (SITE_NAME) }
      style { (PreEscaped(PAGE_CSS)) }
    }
  }
}

fn navigation(auth: Option<&AuthData>) -> Markup {
  html! {
    header {
      nav {
        a class="brand" href="/" { (SITE_NAME) }
        @if let Some(auth) = auth {
          a href="/post/new/" { "Write" }
          a href={ "/users/" (auth.username) "/" } { (auth.username) }
          form method="post" action="/logout/" {
            button class="link" type="submit" { "Sign out" }
          }
        } @else {
          a href="/login/" { "Sign in" }
          a href="/register/" { "Register" }
        }
      }
    }
  }
}

/// Full page with navigation and flash messages around `body`.
pub fn layout(title: &str, auth: Option<&AuthData>, flashes: &[Flash], body: Markup) -> Markup {
  html! {
    (DOCTYPE)
    html lang="en" {
      (head(title))
      body {
        (navigation(auth))
        main {
          @for flash in flashes {
            div class=(flash_class(flash.level)) { (flash.message) }
          }
          (body)
        }
      }
    }
  }
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
  let title = status.canonical_reason().unwrap_or("Error");
  html! {
    (DOCTYPE)
    html lang="en" {
      (head(title))
      body {
        (navigation(None))
        main {
          div class="card" {
            h1 { (status.as_u16()) " " (title) }
            p { (message) }
            p { a href="/" { "Back to all posts" } }
          }
        }
      }
    }
  }
}

fn field_errors(errors: &FormErrors, name: &str) -> Markup {
  html! {
    @for message in errors.field(name) {
      span class="error" { (message) }
    }
  }
}

pub fn non_field_errors(errors: &FormErrors) -> Markup {
  html! {
    @for message in errors.non_field() {
      div class="flash flash-error" { (message) }
    }
  }
}

pub fn input_field(label: &str, name: &str, kind: &str, value: &str, errors: &FormErrors) -> Markup {
  html! {
    p class="field" {
      label for=(name) { (label) }
      input type=(kind) id=(name) name=(name) value=(value);
      (field_errors(errors, name))
    }
  }
}

pub fn textarea_field(
  label: &str,
  name: &str,
  rows: u32,
  placeholder: &str,
  value: &str,
  errors: &FormErrors,
) -> Markup {
  html! {
    p class="field" {
      label for=(name) { (label) }
      textarea id=(name) name=(name) rows=(rows) placeholder=(placeholder) { (value) }
      (field_errors(errors, name))
    }
  }
}

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
  match text.char_indices().nth(max) {
    Some((idx, _)) => format!("{}…", text[..idx].trim_end()),
    None => text.to_string(),
  }
}
