pub mod user;
pub mod profile;
pub mod post;
pub mod comment;
pub mod like;

pub use self::{
  user::*,
  profile::*,
  post::*,
  comment::*,
  like::*,
};
