use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use jsonwebtoken::errors::Error as JwtError;

use thiserror::Error;

use crate::templates;

#[derive(Error, Debug)]
pub enum Error {
  // 401
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  // 403
  #[error("forbidden: {0}")]
  Forbidden(String),

  // 404
  #[error("not found: {0}")]
  NotFound(String),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // 400
  #[error("bad request: {0}")]
  BadRequest(String),

  // Password error
  #[error("Password error: {0}")]
  PasswordError(String),

  #[error("JWT error")]
  JwtError {
    #[from]
    source: JwtError,
  },

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  #[error("crossbeam recv error")]
  RecvError {
    #[from]
    source: crossbeam_channel::RecvError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl Error {
  pub fn not_found(what: impl Into<String>) -> Self {
    Error::NotFound(what.into())
  }

  pub fn password<E: std::fmt::Debug>(err: E) -> Self {
    Error::PasswordError(format!("{:?}", err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// Errors render as plain HTML pages.
impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::DisconnectedError(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let message = match self {
      Error::Unauthorized(ref message) |
      Error::Forbidden(ref message) |
      Error::NotFound(ref message) |
      Error::BadRequest(ref message) => message.clone(),
      Error::DisconnectedError(ref message) => {
        error!("DisconnectedError: {}", message);
        "The database is unavailable.".to_string()
      },
      ref err => {
        error!("InternalServerError: {:?}", err);
        "Internal Server Error".to_string()
      },
    };
    HttpResponse::build(status)
      .content_type("text/html; charset=utf-8")
      .body(templates::error_page(status, &message).into_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes() {
    assert_eq!(Error::not_found("post").status_code(), StatusCode::NOT_FOUND);
    assert_eq!(Error::Forbidden("no".into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(Error::DisconnectedError("db".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(Error::InternalServerError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn internal_details_are_hidden() {
    let err = Error::PasswordError("bad phc".into());
    let resp = err.error_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
