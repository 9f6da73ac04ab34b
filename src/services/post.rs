use log::*;

use actix_web::{get, post, web, HttpResponse};

use crate::error::*;
use crate::app::*;
use crate::auth::{AuthData, Flash};
use crate::db::Store;
use crate::forms::*;
use crate::models::*;
use crate::templates;
use crate::util::is_local_path;

use crate::middleware::Auth;

use super::Page;

fn detail_url(post_id: i32) -> String {
  format!("/post/{}/", post_id)
}

async fn get_summary(store: &dyn Store, viewer: Option<i32>, post_id: i32) -> Result<PostSummary> {
  store.post_summary(viewer, post_id).await?
    .ok_or_else(|| Error::not_found("No post matches the given query."))
}

async fn get_owned(store: &dyn Store, auth: &AuthData, post_id: i32) -> Result<Post> {
  store.owned_post(post_id, auth.user_id).await?
    .ok_or_else(|| Error::not_found("No post matches the given query."))
}

/// all posts, newest first
#[get("/")]
async fn home(
  page: Page,
  store: web::Data<dyn Store>,
) -> Result<HttpResponse> {
  let posts = store.list_posts(page.user_id()).await?;
  Ok(page.render("Home", templates::post::home(&posts, page.auth.as_ref())))
}

async fn render_detail(
  page: &Page,
  store: &dyn Store,
  summary: &PostSummary,
  form: &CommentForm,
  errors: &FormErrors,
) -> Result<HttpResponse> {
  let comments = store.comments_for_post(summary.post.id).await?;
  let body = templates::post::detail(summary, &comments, form, errors, page.auth.as_ref());
  Ok(page.render(&summary.post.title, body))
}

/// post with its comments
#[get("/post/{id:\\d+}/")]
async fn post_detail(
  page: Page,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
) -> Result<HttpResponse> {
  let summary = get_summary(&**store, page.user_id(), path.into_inner()).await?;
  render_detail(&page, &**store, &summary, &CommentForm::default(), &FormErrors::new()).await
}

/// inline comment form on the post page
#[post("/post/{id:\\d+}/")]
async fn post_detail_comment(
  page: Page,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
  form: Option<web::Form<CommentForm>>,
) -> Result<HttpResponse> {
  let summary = get_summary(&**store, page.user_id(), path.into_inner()).await?;
  let auth = match page.auth.as_ref() {
    Some(auth) => auth,
    None => {
      return page.redirect("/login/")
        .flash(Flash::error("Please sign in to comment."))
        .finish();
    },
  };
  let form = form.map(web::Form::into_inner).unwrap_or_default();
  match form.validate() {
    Ok(content) => {
      store.create_comment(summary.post.id, auth.user_id, &content).await?;
      page.redirect(detail_url(summary.post.id))
        .flash(Flash::success("Comment added."))
        .finish()
    },
    Err(errors) => render_detail(&page, &**store, &summary, &form, &errors).await,
  }
}

/// comment endpoint used by plain forms
#[post("/post/{id:\\d+}/comment/", wrap="Auth::required()")]
async fn add_comment(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
  form: Option<web::Form<CommentForm>>,
) -> Result<HttpResponse> {
  let post = store.post_by_id(path.into_inner()).await?
    .ok_or_else(|| Error::not_found("No post matches the given query."))?;
  let redirect = page.redirect(detail_url(post.id));
  // A missing or unreadable body is just an empty comment.
  let form = form.map(web::Form::into_inner).unwrap_or_default();
  match form.validate() {
    Ok(content) => {
      store.create_comment(post.id, auth.user_id, &content).await?;
      redirect.flash(Flash::success("Comment added.")).finish()
    },
    Err(_) => {
      redirect.flash(Flash::error("Please correct the comment and try again.")).finish()
    },
  }
}

#[get("/post/new/", wrap="Auth::required()")]
async fn post_create_form(
  page: Page,
) -> Result<HttpResponse> {
  Ok(page.render("New blog", templates::post::form("Create", &PostForm::default(), &FormErrors::new())))
}

#[post("/post/new/", wrap="Auth::required()")]
async fn post_create(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  form: web::Form<PostForm>,
) -> Result<HttpResponse> {
  match form.validate() {
    Ok(changes) => {
      let post = store.create_post(auth.user_id, &changes).await?;
      info!("{} created post {}", auth.username, post.id);
      page.redirect(detail_url(post.id))
        .flash(Flash::success("Blog created."))
        .finish()
    },
    Err(errors) => {
      Ok(page.render("New blog", templates::post::form("Create", &form, &errors)))
    },
  }
}

#[get("/post/{id:\\d+}/edit/", wrap="Auth::required()")]
async fn post_update_form(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
) -> Result<HttpResponse> {
  let post = get_owned(&**store, &auth, path.into_inner()).await?;
  let form = PostForm::from(&post);
  Ok(page.render("Edit blog", templates::post::form("Update", &form, &FormErrors::new())))
}

#[post("/post/{id:\\d+}/edit/", wrap="Auth::required()")]
async fn post_update(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
  form: web::Form<PostForm>,
) -> Result<HttpResponse> {
  let post = get_owned(&**store, &auth, path.into_inner()).await?;
  match form.validate() {
    Ok(changes) => {
      store.update_post(post.id, auth.user_id, &changes).await?;
      page.redirect(detail_url(post.id))
        .flash(Flash::success("Blog updated."))
        .finish()
    },
    Err(errors) => {
      Ok(page.render("Edit blog", templates::post::form("Update", &form, &errors)))
    },
  }
}

#[get("/post/{id:\\d+}/delete/", wrap="Auth::required()")]
async fn post_delete_confirm(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
) -> Result<HttpResponse> {
  let post = get_owned(&**store, &auth, path.into_inner()).await?;
  Ok(page.render("Delete blog", templates::post::confirm_delete(&post)))
}

#[post("/post/{id:\\d+}/delete/", wrap="Auth::required()")]
async fn post_delete(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
) -> Result<HttpResponse> {
  let post = get_owned(&**store, &auth, path.into_inner()).await?;
  store.delete_post(post.id, auth.user_id).await?;
  info!("{} deleted post {}", auth.username, post.id);
  page.redirect("/")
    .flash(Flash::info("Blog deleted."))
    .finish()
}

#[post("/post/{id:\\d+}/like/", wrap="Auth::required()")]
async fn toggle_like(
  page: Page,
  auth: AuthData,
  store: web::Data<dyn Store>,
  path: web::Path<i32>,
  form: Option<web::Form<LikeForm>>,
) -> Result<HttpResponse> {
  let post = store.post_by_id(path.into_inner()).await?
    .ok_or_else(|| Error::not_found("No post matches the given query."))?;
  let flash = match store.toggle_like(auth.user_id, post.id).await? {
    Toggled::Added => Flash::success("You liked this post."),
    Toggled::Removed => Flash::info("You unliked this post."),
  };
  let next = match form.and_then(|form| form.into_inner().next) {
    Some(next) if is_local_path(&next) => next,
    _ => detail_url(post.id),
  };
  page.redirect(next).flash(flash).finish()
}

#[derive(Debug, Clone, Default)]
pub struct PostService;

impl super::Service for PostService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(home)
      .service(post_create_form)
      .service(post_create)
      .service(post_detail)
      .service(post_detail_comment)
      .service(add_comment)
      .service(post_update_form)
      .service(post_update)
      .service(post_delete_confirm)
      .service(post_delete)
      .service(toggle_like);
  }
}

pub fn new_factory() -> PostService {
  Default::default()
}
