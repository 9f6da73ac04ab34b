use serde::{Deserialize, Serialize};

use chrono::{Duration, Utc};

use actix_web::cookie::{time, Cookie, SameSite};

use jsonwebtoken::{
  encode, Header, EncodingKey,
  decode, DecodingKey,
  Validation
};

use crate::error::*;
use crate::app::AppConfig;
use crate::models::User;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

const FLASH_TTL_MINUTES: i64 = 5;

/// The signed-in user, decoded from the session cookie.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AuthData {
  pub user_id: i32,
  pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub id: i32,
  pub username: String,
  pub exp: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
  Success,
  Info,
  Error,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flash {
  pub level: FlashLevel,
  pub message: String,
}

impl Flash {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Success, message: message.into() }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Info, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Error, message: message.into() }
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlashClaims {
  messages: Vec<Flash>,
  exp: i64,
}

/// Signing keys and cookie settings for sessions and flash messages.
#[derive(Clone)]
pub struct SessionKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  pub ttl_days: i64,
  pub secure: bool,
}

impl SessionKeys {
  pub fn new(secret: &str, ttl_days: i64, secure: bool) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_ref()),
      decoding: DecodingKey::from_secret(secret.as_ref()),
      ttl_days,
      secure,
    }
  }

  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let secret = config.get_str("session.secret")?
      .ok_or_else(|| anyhow::anyhow!("session.secret must be set"))?;
    let ttl_days = config.get_int("session.ttl_days")?.unwrap_or(14);
    let secure = config.get_bool("session.secure")?.unwrap_or(false);
    Ok(Self::new(&secret, ttl_days, secure))
  }

  fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
    Ok(encode(&Header::default(), claims, &self.encoding)?)
  }

  pub fn encode_flash(&self, messages: &[Flash]) -> Result<String> {
    self.sign(&FlashClaims {
      messages: messages.to_vec(),
      exp: (Utc::now() + Duration::minutes(FLASH_TTL_MINUTES)).timestamp(),
    })
  }

  /// Tampered or expired flash cookies are dropped.
  pub fn decode_flash(&self, token: &str) -> Vec<Flash> {
    match decode::<FlashClaims>(token, &self.decoding, &Validation::default()) {
      Ok(data) => data.claims.messages,
      Err(err) => {
        log::debug!("Dropping invalid flash cookie: {:?}", err);
        Vec::new()
      },
    }
  }

  fn cookie(&self, name: &'static str, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build(name, value)
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .secure(self.secure)
      .max_age(max_age)
      .finish()
  }

  pub fn session_cookie(&self, token: String) -> Cookie<'static> {
    self.cookie(SESSION_COOKIE, token, time::Duration::days(self.ttl_days))
  }

  pub fn flash_cookie(&self, token: String) -> Cookie<'static> {
    self.cookie(FLASH_COOKIE, token, time::Duration::minutes(FLASH_TTL_MINUTES))
  }

  /// An expired cookie that makes the browser drop `name`.
  pub fn removal_cookie(&self, name: &'static str) -> Cookie<'static> {
    self.cookie(name, String::new(), time::Duration::ZERO)
  }
}

pub trait GenerateJwt {
  fn generate_jwt(&self, keys: &SessionKeys) -> Result<String>;
}

pub trait DecodeJwt {
  fn decode_jwt(&self, keys: &SessionKeys) -> Result<AuthData>;
}

impl GenerateJwt for AuthData {
  fn generate_jwt(&self, keys: &SessionKeys) -> Result<String> {
    keys.sign(&Claims {
      id: self.user_id,
      username: self.username.clone(),
      exp: (Utc::now() + Duration::days(keys.ttl_days)).timestamp(),
    })
  }
}

impl GenerateJwt for User {
  fn generate_jwt(&self, keys: &SessionKeys) -> Result<String> {
    AuthData::from(self).generate_jwt(keys)
  }
}

impl DecodeJwt for str {
  fn decode_jwt(&self, keys: &SessionKeys) -> Result<AuthData> {
    let token = decode::<Claims>(self, &keys.decoding, &Validation::default())?;
    Ok(AuthData {
      user_id: token.claims.id,
      username: token.claims.username,
    })
  }
}

impl From<&User> for AuthData {
  fn from(user: &User) -> Self {
    Self {
      user_id: user.id,
      username: user.username.clone(),
    }
  }
}
