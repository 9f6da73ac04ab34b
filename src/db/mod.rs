pub mod util;

mod user;
mod profile;
mod post;
mod comment;
mod like;
pub use self::{
  user::*,
  profile::*,
  post::*,
  comment::*,
  like::*,
};

mod service;
pub use service::*;

mod store;
pub use store::*;

mod memory;
pub use memory::*;

pub mod schema;
