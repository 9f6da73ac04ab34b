use log::*;

use actix_web::{get, post, web, HttpResponse};

use crate::error::*;
use crate::app::*;
use crate::auth::*;
use crate::db::Store;
use crate::forms::*;
use crate::models::*;
use crate::templates::{self, profile::ProfileView};

use crate::middleware::Auth;

use super::Page;

fn profile_url(username: &str) -> String {
  format!("/users/{}/", username)
}

async fn get_user(store: &dyn Store, username: &str) -> Result<User> {
  store.user_by_username(username).await?
    .ok_or_else(|| Error::not_found("No user matches the given query."))
}

async fn get_details(store: &dyn Store, user_id: i32) -> Result<ProfileDetails> {
  store.profile_details(user_id).await?
    .ok_or_else(|| Error::not_found("No profile matches the given query."))
}

/// profile page with the user's posts
#[get("/users/{username}/")]
async fn profile_detail(
  page: Page,
  store: web::Data<dyn Store>,
  username: web::Path<String>,
) -> Result<HttpResponse> {
  let user = get_user(&**store, &username).await?;
  let details = get_details(&**store, user.id).await?;
  let posts = store.posts_by_author(page.user_id(), user.id).await?;

  let viewer = page.user_id();
  let is_self = viewer == Some(user.id);
  let is_following = match viewer {
    Some(viewer) if !is_self => store.is_following(viewer, user.id).await?,
    _ => false,
  };

  let view = ProfileView {
    details: &details,
    posts: &posts,
    is_self,
    is_following,
  };
  Ok(page.render(&user.username, templates::profile::detail(&view, page.auth.as_ref())))
}

#[get("/profile/edit/", wrap="Auth::required()")]
async fn profile_edit_form(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
) -> Result<HttpResponse> {
  let details = get_details(&**store, auth.user_id).await?;
  let form = ProfileForm::from(&ProfileChanges::from(&details.profile));
  Ok(page.render("Edit profile", templates::profile::edit(&form, &FormErrors::new())))
}

#[post("/profile/edit/", wrap="Auth::required()")]
async fn profile_edit(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  form: web::Form<ProfileForm>,
) -> Result<HttpResponse> {
  match form.validate() {
    Ok(changes) => {
      if store.update_profile(auth.user_id, &changes).await? == 0 {
        return Err(Error::not_found("No profile matches the given query."));
      }
      page.redirect(profile_url(&auth.username))
        .flash(Flash::success("Profile updated."))
        .finish()
    },
    Err(errors) => {
      Ok(page.render("Edit profile", templates::profile::edit(&form, &errors)))
    },
  }
}

#[get("/profile/delete/", wrap="Auth::required()")]
async fn profile_delete_confirm(
  page: Page,
  auth: AuthData,
) -> Result<HttpResponse> {
  Ok(page.render("Delete account", templates::profile::confirm_delete(&auth.username)))
}

/// delete the account, signing the user out
#[post("/profile/delete/", wrap="Auth::required()")]
async fn profile_delete(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
) -> Result<HttpResponse> {
  store.delete_user(auth.user_id).await?;
  info!("Deleted user: {}", auth.username);
  page.redirect("/")
    .flash(Flash::info(format!("Profile {} deleted.", auth.username)))
    .cookie(page.keys().removal_cookie(SESSION_COOKIE))
    .finish()
}

/// follow or unfollow a user
#[post("/users/{username}/follow/", wrap="Auth::required()")]
async fn toggle_follow(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  username: web::Path<String>,
) -> Result<HttpResponse> {
  let target = get_user(&**store, &username).await?;
  let redirect = page.redirect(profile_url(&target.username));
  if target.id == auth.user_id {
    return redirect.flash(Flash::error("You cannot follow yourself.")).finish();
  }
  let flash = match store.toggle_follow(auth.user_id, target.id).await? {
    Toggled::Added => Flash::success(format!("You followed {}.", target.username)),
    Toggled::Removed => Flash::info(format!("You unfollowed {}.", target.username)),
  };
  redirect.flash(flash).finish()
}

#[derive(Debug, Clone, Default)]
pub struct ProfileService;

impl super::Service for ProfileService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(profile_detail)
      .service(profile_edit_form)
      .service(profile_edit)
      .service(profile_delete_confirm)
      .service(profile_delete)
      .service(toggle_follow);
  }
}

pub fn new_factory() -> ProfileService {
  Default::default()
}
