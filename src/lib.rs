#[macro_use]
extern crate lazy_static;

pub mod error;
pub use error::Error;

mod util;

pub mod app;

pub mod auth;

pub mod middleware;

pub mod forms;

pub mod models;

pub mod templates;

pub mod services;

pub mod db;
