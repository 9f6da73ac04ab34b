use maud::{html, Markup};

use crate::auth::AuthData;
use crate::forms::{CommentForm, FormErrors, PostForm};
use crate::models::{CommentDetails, Post, PostSummary};
use crate::util::display_timestamp;

use super::{excerpt, input_field, non_field_errors, textarea_field};

const EXCERPT_LEN: usize = 280;

fn byline(summary: &PostSummary) -> Markup {
  html! {
    p class="meta" {
      "by " a href={ "/users/" (summary.author) "/" } { (summary.author) }
      " · " (display_timestamp(&summary.post.created_at))
    }
  }
}

/// Like button (or counter for anonymous viewers) returning to `next`.
fn like_button(summary: &PostSummary, auth: Option<&AuthData>, next: &str) -> Markup {
  let id = summary.post.id;
  html! {
    @if auth.is_some() {
      form method="post" action={ "/post/" (id) "/like/" } {
        input type="hidden" name="next" value=(next);
        button type="submit" {
          @if summary.liked { "Unlike" } @else { "Like" }
          " (" (summary.like_count) ")"
        }
      }
    } @else {
      span class="meta" { (summary.like_count) " likes" }
    }
  }
}

pub fn post_card(summary: &PostSummary, auth: Option<&AuthData>, next: &str) -> Markup {
  let id = summary.post.id;
  html! {
    article class="card" {
      h2 { a href={ "/post/" (id) "/" } { (summary.post.title) } }
      (byline(summary))
      p class="content" { (excerpt(&summary.post.content, EXCERPT_LEN)) }
      div class="actions" {
        (like_button(summary, auth, next))
        a href={ "/post/" (id) "/" } { (summary.comment_count) " comments" }
      }
    }
  }
}

pub fn home(posts: &[PostSummary], auth: Option<&AuthData>) -> Markup {
  html! {
    h1 { "Latest posts" }
    @if posts.is_empty() {
      p class="meta" { "Nothing here yet." }
    }
    @for summary in posts {
      (post_card(summary, auth, "/"))
    }
  }
}

pub fn detail(
  summary: &PostSummary,
  comments: &[CommentDetails],
  form: &CommentForm,
  errors: &FormErrors,
  auth: Option<&AuthData>,
) -> Markup {
  let post = &summary.post;
  let detail_url = format!("/post/{}/", post.id);
  let is_author = auth.map_or(false, |a| a.user_id == post.author_id);
  html! {
    article class="card" {
      h1 { (post.title) }
      (byline(summary))
      @if post.updated_at > post.created_at {
        p class="meta" { "edited " (display_timestamp(&post.updated_at)) }
      }
      div class="content" { (post.content) }
      div class="actions" {
        (like_button(summary, auth, &detail_url))
        @if is_author {
          a href={ "/post/" (post.id) "/edit/" } { "Edit" }
          a href={ "/post/" (post.id) "/delete/" } { "Delete" }
        }
      }
    }
    section class="card" {
      h2 { "Comments (" (comments.len()) ")" }
      @for details in comments {
        div class="comment" {
          p class="meta" {
            a href={ "/users/" (details.author) "/" } { (details.author) }
            " · " (display_timestamp(&details.comment.created_at))
          }
          div class="content" { (details.comment.content) }
        }
      }
      @if auth.is_some() {
        form method="post" action=(detail_url) {
          (non_field_errors(errors))
          (textarea_field("Comment", "content", 3, "Add a thoughtful comment", &form.content, errors))
          button type="submit" { "Comment" }
        }
      } @else {
        p { a href="/login/" { "Sign in" } " to comment." }
      }
    }
  }
}

/// Create/update form. `action` is "Create" or "Update".
pub fn form(action: &str, form: &PostForm, errors: &FormErrors) -> Markup {
  html! {
    div class="card" {
      h1 { (action) " blog" }
      form method="post" {
        (non_field_errors(errors))
        (input_field("Title", "title", "text", &form.title, errors))
        (textarea_field("Content", "content", 6, "Write your story...", &form.content, errors))
        button type="submit" { (action) }
      }
    }
  }
}

pub fn confirm_delete(post: &Post) -> Markup {
  html! {
    div class="card" {
      h1 { "Delete blog" }
      p { "Are you sure you want to delete \"" (post.title) "\"?" }
      form method="post" {
        div class="actions" {
          button class="danger" type="submit" { "Delete" }
          a href={ "/post/" (post.id) "/" } { "Cancel" }
        }
      }
    }
  }
}
