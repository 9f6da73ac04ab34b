use log::*;

use actix_web::{get, post, web, HttpResponse};

use crate::error::*;
use crate::app::*;
use crate::auth::*;
use crate::db::Store;
use crate::forms::*;
use crate::models::NewUser;
use crate::templates;

use super::Page;

fn registration_closed() -> Error {
  Error::Forbidden("Registration is closed.".to_string())
}

#[get("/register/")]
async fn register_form(
  cfg: web::Data<UserService>,
  page: Page,
) -> Result<HttpResponse> {
  if !cfg.allow_register {
    return Err(registration_closed());
  }
  Ok(page.render("Register", templates::user::register(&RegisterForm::default(), &FormErrors::new())))
}

/// register new user and sign them in
#[post("/register/")]
async fn register(
  cfg: web::Data<UserService>,
  page: Page,
  store: web::Data<dyn Store>,
  form: web::Form<RegisterForm>,
) -> Result<HttpResponse> {
  if !cfg.allow_register {
    return Err(registration_closed());
  }
  let mut form = form.into_inner();
  let username = form.cleaned_username();
  let taken = !username.is_empty() && store.user_by_username(&username).await?.is_some();
  let result = form.validate_with(taken);
  // Never echo passwords back.
  form.password1.clear();
  form.password2.clear();
  let reg = match result {
    Ok(reg) => reg,
    Err(errors) => {
      return Ok(page.render("Register", templates::user::register(&form, &errors)));
    },
  };

  let new_user = NewUser {
    username: reg.username,
    email: reg.email,
    password: pass::hash_password(&reg.password)?,
  };
  let user = match store.create_user(&new_user).await? {
    Some(user) => user,
    None => {
      // Registered between the check above and the insert.
      let mut errors = FormErrors::new();
      errors.add("username", USERNAME_TAKEN);
      return Ok(page.render("Register", templates::user::register(&form, &errors)));
    },
  };
  info!("Registered user: {}", user.username);

  let token = user.generate_jwt(page.keys())?;
  page.redirect("/")
    .flash(Flash::success("Welcome! Your account has been created."))
    .cookie(page.keys().session_cookie(token))
    .finish()
}

#[get("/login/")]
async fn login_form(
  page: Page,
) -> Result<HttpResponse> {
  if page.auth.is_some() {
    return page.redirect("/").finish();
  }
  Ok(page.render("Sign in", templates::user::login(&LoginForm::default(), &FormErrors::new())))
}

/// login user
#[post("/login/")]
async fn login(
  page: Page,
  store: web::Data<dyn Store>,
  form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
  if page.auth.is_some() {
    return page.redirect("/").finish();
  }
  let mut form = form.into_inner();
  let result = form.validate();
  form.password.clear();
  let (username, password) = match result {
    Ok(creds) => creds,
    Err(errors) => {
      return Ok(page.render("Sign in", templates::user::login(&form, &errors)));
    },
  };

  if let Some(user) = store.user_by_username(&username).await? {
    let res = pass::check_password(&user.password, &password)?;
    debug!("login: user={} is_valid={}", user.username, res.is_valid);
    if res.is_valid {
      if res.needs_update {
        info!("Rehash password for user: {}", user.username);
        let hash = pass::hash_password(&password)?;
        store.update_password(user.id, &hash).await?;
      }
      let token = user.generate_jwt(page.keys())?;
      return page.redirect("/")
        .flash(Flash::success("Signed in successfully."))
        .cookie(page.keys().session_cookie(token))
        .finish();
    }
  }

  let mut errors = FormErrors::new();
  errors.add_non_field(INVALID_LOGIN);
  Ok(page.render("Sign in", templates::user::login(&form, &errors)))
}

#[post("/logout/")]
async fn logout(
  page: Page,
) -> Result<HttpResponse> {
  page.redirect("/")
    .flash(Flash::info("You have been signed out."))
    .cookie(page.keys().removal_cookie(SESSION_COOKIE))
    .finish()
}

#[derive(Debug, Clone)]
pub struct UserService {
  pub allow_register: bool,
}

impl Default for UserService {
  fn default() -> Self {
    Self {
      allow_register: true,
    }
  }
}

impl super::Service for UserService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.allow_register = config.get_bool("User.allow_register")?.unwrap_or(true);
    Ok(())
  }

  fn web_config(&self, web: &mut web::ServiceConfig) {
    web
      .app_data(web::Data::new(self.clone()))
      .service(register_form)
      .service(register)
      .service(login_form)
      .service(login)
      .service(logout);
  }
}

pub fn new_factory() -> UserService {
  Default::default()
}
