use serde::{Deserialize, Serialize};

use crate::models::ProfileChanges;

use super::*;

pub const LOCATION_MAX_LEN: usize = 120;
pub const WEBSITE_MAX_LEN: usize = 200;

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileForm {
  pub bio: String,
  pub location: String,
  pub website: String,
}

impl ProfileForm {
  pub fn validate(&self) -> Result<ProfileChanges, FormErrors> {
    let mut errors = FormErrors::new();
    let bio = clean(&self.bio);
    let location = clean(&self.location);
    let website = clean(&self.website);
    check_max_len(&mut errors, "location", &location, LOCATION_MAX_LEN);
    if !website.is_empty() {
      check_max_len(&mut errors, "website", &website, WEBSITE_MAX_LEN);
      if !is_valid_url(&website) {
        errors.add("website", "Enter a valid URL.");
      }
    }
    errors.finish(ProfileChanges { bio, location, website })
  }
}

impl From<&ProfileChanges> for ProfileForm {
  fn from(changes: &ProfileChanges) -> Self {
    Self {
      bio: changes.bio.clone(),
      location: changes.location.clone(),
      website: changes.website.clone(),
    }
  }
}

/// Accepts `http(s)://host[:port][/path]` where host is a dotted name or localhost.
pub fn is_valid_url(url: &str) -> bool {
  if url.chars().any(char::is_whitespace) {
    return false;
  }
  let rest = match url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) {
    Some(rest) => rest,
    None => return false,
  };
  let authority = rest.split(|c| c == '/' || c == '?' || c == '#').next().unwrap_or_default();
  let host = match authority.rsplit_once(':') {
    Some((host, port)) => {
      if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
        return false;
      }
      host
    },
    None => authority,
  };
  if host.eq_ignore_ascii_case("localhost") {
    return true;
  }
  let labels: Vec<&str> = host.split('.').collect();
  labels.len() >= 2 && labels.iter().all(|l| {
    !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == '-')
  })
}
