use log::*;

use std::future::{ready, Ready};

use actix_web::{
  cookie::Cookie,
  dev::Payload,
  http::header::{ContentType, LOCATION},
  web, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};

use maud::Markup;

use crate::error::*;
use crate::auth::*;
use crate::templates;

/// Per-request page context: the signed-in user and any pending flash messages.
pub struct Page {
  pub auth: Option<AuthData>,
  pub flashes: Vec<Flash>,
  had_flash: bool,
  keys: web::Data<SessionKeys>,
}

impl FromRequest for Page {
  type Error = Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    let keys = match req.app_data::<web::Data<SessionKeys>>() {
      Some(keys) => keys.clone(),
      None => {
        error!("SessionKeys missing from app data");
        return ready(Err(Error::InternalServerError));
      },
    };
    let auth = req.extensions().get::<AuthData>().cloned();
    let cookie = req.cookie(FLASH_COOKIE);
    let flashes = cookie.as_ref()
      .map(|c| keys.decode_flash(c.value()))
      .unwrap_or_default();
    ready(Ok(Page {
      auth,
      flashes,
      had_flash: cookie.is_some(),
      keys,
    }))
  }
}

impl Page {
  pub fn user_id(&self) -> Option<i32> {
    self.auth.as_ref().map(|auth| auth.user_id)
  }

  pub fn keys(&self) -> &SessionKeys {
    &self.keys
  }

  /// Render `body` inside the site layout.  Shown flashes are consumed.
  pub fn render(&self, title: &str, body: Markup) -> HttpResponse {
    let html = templates::layout(title, self.auth.as_ref(), &self.flashes, body);
    let mut res = HttpResponse::Ok();
    res.insert_header(ContentType::html());
    if self.had_flash {
      res.cookie(self.keys.removal_cookie(FLASH_COOKIE));
    }
    res.body(html.into_string())
  }

  pub fn redirect(&self, location: impl Into<String>) -> Redirect<'_> {
    Redirect {
      page: self,
      location: location.into(),
      flashes: Vec::new(),
      cookies: Vec::new(),
    }
  }
}

/// A 303 redirect that can queue flash messages and extra cookies.
pub struct Redirect<'a> {
  page: &'a Page,
  location: String,
  flashes: Vec<Flash>,
  cookies: Vec<Cookie<'static>>,
}

impl<'a> Redirect<'a> {
  pub fn flash(mut self, flash: Flash) -> Self {
    self.flashes.push(flash);
    self
  }

  pub fn cookie(mut self, cookie: Cookie<'static>) -> Self {
    self.cookies.push(cookie);
    self
  }

  pub fn finish(self) -> Result<HttpResponse> {
    let mut res = HttpResponse::SeeOther();
    res.insert_header((LOCATION, self.location));

    // Unread flashes travel on to the next rendered page.
    let mut flashes = self.page.flashes.clone();
    flashes.extend(self.flashes);
    if !flashes.is_empty() {
      let token = self.page.keys.encode_flash(&flashes)?;
      res.cookie(self.page.keys.flash_cookie(token));
    } else if self.page.had_flash {
      res.cookie(self.page.keys.removal_cookie(FLASH_COOKIE));
    }
    for cookie in self.cookies {
      res.cookie(cookie);
    }
    Ok(res.finish())
  }
}
