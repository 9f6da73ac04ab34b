use maud::{html, Markup};

use crate::auth::AuthData;
use crate::forms::{FormErrors, ProfileForm};
use crate::models::{PostSummary, ProfileDetails};
use crate::util::display_timestamp;

use super::{input_field, non_field_errors, post::post_card, textarea_field};

pub struct ProfileView<'a> {
  pub details: &'a ProfileDetails,
  pub posts: &'a [PostSummary],
  pub is_self: bool,
  pub is_following: bool,
}

pub fn detail(view: &ProfileView, auth: Option<&AuthData>) -> Markup {
  let details = view.details;
  let profile = &details.profile;
  let profile_url = format!("/users/{}/", details.username);
  html! {
    section class="card" {
      h1 { (details.username) }
      @if !profile.bio.is_empty() {
        p class="content" { (profile.bio) }
      }
      p class="meta" {
        @if !profile.location.is_empty() {
          (profile.location) " · "
        }
        @if !profile.website.is_empty() {
          a href=(profile.website) rel="nofollow noopener" { (profile.website) } " · "
        }
        "joined " (display_timestamp(&profile.created_at))
      }
      p class="meta" {
        (details.followers_count) " followers · " (details.following_count) " following"
      }
      div class="actions" {
        @if view.is_self {
          a href="/profile/edit/" { "Edit profile" }
          a href="/profile/delete/" { "Delete account" }
        } @else if auth.is_some() {
          form method="post" action={ (profile_url) "follow/" } {
            button type="submit" {
              @if view.is_following { "Unfollow" } @else { "Follow" }
            }
          }
        }
      }
    }
    h2 { "Posts" }
    @if view.posts.is_empty() {
      p class="meta" { "No posts yet." }
    }
    @for summary in view.posts {
      (post_card(summary, auth, &profile_url))
    }
  }
}

pub fn edit(form: &ProfileForm, errors: &FormErrors) -> Markup {
  html! {
    div class="card" {
      h1 { "Edit profile" }
      form method="post" action="/profile/edit/" {
        (non_field_errors(errors))
        (textarea_field("Bio", "bio", 4, "", &form.bio, errors))
        (input_field("Location", "location", "text", &form.location, errors))
        (input_field("Website", "website", "url", &form.website, errors))
        button type="submit" { "Save" }
      }
    }
  }
}

pub fn confirm_delete(username: &str) -> Markup {
  html! {
    div class="card" {
      h1 { "Delete account" }
      p {
        "This permanently deletes " strong { (username) } " along with all posts, "
        "comments and likes. This cannot be undone."
      }
      form method="post" action="/profile/delete/" {
        div class="actions" {
          button class="danger" type="submit" { "Delete my account" }
          a href={ "/users/" (username) "/" } { "Cancel" }
        }
      }
    }
  }
}
