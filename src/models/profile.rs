use chrono::NaiveDateTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
  pub id: i32,
  pub user_id: i32,
  pub bio: String,
  pub location: String,
  pub website: String,
  pub created_at: NaiveDateTime,
}

/// Profile page data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileDetails {
  pub username: String,
  pub profile: Profile,
  pub followers_count: i64,
  pub following_count: i64,
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
  pub bio: String,
  pub location: String,
  pub website: String,
}

impl From<&Profile> for ProfileChanges {
  fn from(profile: &Profile) -> Self {
    Self {
      bio: profile.bio.clone(),
      location: profile.location.clone(),
      website: profile.website.clone(),
    }
  }
}
