use log::*;

use std::future::{ready, Ready};
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use actix_web::{
  body::EitherBody,
  dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
  http::header::LOCATION,
  web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};

use crate::auth::*;
use crate::db::Store;

pub const LOGIN_URL: &str = "/login/";

/// Decode the session cookie, if there is a valid one.
pub fn session_auth(req: &ServiceRequest) -> Option<AuthData> {
  let cookie = req.cookie(SESSION_COOKIE)?;
  if cookie.value().is_empty() {
    return None;
  }
  let keys = match req.app_data::<web::Data<SessionKeys>>() {
    Some(keys) => keys,
    None => {
      error!("SessionKeys missing from app data");
      return None;
    },
  };
  match cookie.value().decode_jwt(keys) {
    Ok(auth) => Some(auth),
    Err(err) => {
      // Expired or forged, treat as anonymous.
      debug!("Ignoring invalid session cookie: {:?}", err);
      None
    },
  }
}

/// The session's user, if the cookie is valid and the account still exists.
async fn session_user(req: &ServiceRequest) -> Result<Option<AuthData>, Error> {
  let auth = match session_auth(req) {
    Some(auth) => auth,
    None => return Ok(None),
  };
  let store = match req.app_data::<web::Data<dyn Store>>() {
    Some(store) => store.clone(),
    None => {
      error!("Store missing from app data");
      return Ok(None);
    },
  };
  match store.user_by_id(auth.user_id).await? {
    Some(user) => Ok(Some(AuthData::from(&user))),
    None => {
      debug!("Session user {} no longer exists", auth.user_id);
      Ok(None)
    },
  }
}

impl FromRequest for AuthData {
  type Error = crate::error::Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
    match req.extensions().get::<AuthData>() {
      Some(auth) => ready(Ok(auth.clone())),
      None => ready(Err(crate::error::Error::Unauthorized("Please sign in.".to_string()))),
    }
  }
}

/// Session middleware.  `optional()` only attaches `AuthData` when signed in;
/// `required()` redirects anonymous requests to the login page.
pub struct Auth {
  pub is_optional: bool,
}

impl Auth {
  pub fn required() -> Self {
    Self {
      is_optional: false,
    }
  }

  pub fn optional() -> Self {
    Self {
      is_optional: true,
    }
  }
}

impl<S, B> Transform<S, ServiceRequest> for Auth
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type InitError = ();
  type Transform = AuthMiddleware<S>;
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AuthMiddleware {
      is_optional: self.is_optional,
      service: Rc::new(service),
    }))
  }
}

pub struct AuthMiddleware<S> {
  is_optional: bool,
  service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = self.service.clone();
    let is_optional = self.is_optional;
    Box::pin(async move {
      // An outer Auth may already have resolved the session.
      let resolved = req.extensions().contains::<AuthData>();
      let has_auth = if resolved {
        true
      } else {
        match session_user(&req).await {
          Ok(Some(auth)) => {
            debug!("Session for user: {}", auth.username);
            req.extensions_mut().insert(auth);
            true
          },
          Ok(None) => false,
          Err(err) => return Err(err),
        }
      };

      if has_auth || is_optional {
        service.call(req).await.map(ServiceResponse::map_into_left_body)
      } else {
        debug!("Auth required: redirect {} to login", req.path());
        let (request, _pl) = req.into_parts();
        let response = HttpResponse::SeeOther()
          .insert_header((LOCATION, LOGIN_URL))
          .finish()
          .map_into_right_body();
        Ok(ServiceResponse::new(request, response))
      }
    })
  }
}
