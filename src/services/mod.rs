use log::*;

use std::collections::HashSet;

use actix_web::web;

use crate::error::*;
use crate::app::*;
use crate::auth::SessionKeys;
use crate::db::StoreConfig;

mod page;
pub use page::*;

mod user;
mod profile;
mod post;

type BoxService = Box<dyn Service>;

pub trait Service: ServiceClone + Send {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()>;

  /// Setup Service endpoints.
  fn web_config(&self, _web: &mut web::ServiceConfig) {
  }
}

pub trait ServiceClone {
  fn clone_box(&self) -> BoxService;
}

impl<T> ServiceClone for T
where
    T: 'static + Service + Clone,
{
  fn clone_box(&self) -> BoxService {
    Box::new(self.clone())
  }
}

impl Clone for BoxService {
  fn clone(&self) -> BoxService {
    self.clone_box()
  }
}

#[derive(Clone)]
pub struct Services {
  store: StoreConfig,
  keys: SessionKeys,
  services: Vec<BoxService>,
}

impl Services {
  pub fn new(store: StoreConfig, keys: SessionKeys) -> Services {
    Services {
      store,
      keys,
      services: Vec::new(),
    }
  }

  pub fn store(&self) -> &StoreConfig {
    &self.store
  }

  pub fn keys(&self) -> &SessionKeys {
    &self.keys
  }

  fn load_service(&mut self, name: &str, config: &AppConfig, prefix: &str) -> Result<BoxService> {
    let mut service: BoxService = match name {
      "User" => Box::new(user::new_factory()),
      "Profile" => Box::new(profile::new_factory()),
      "Post" => Box::new(post::new_factory()),
      _ => {
        return Err(anyhow::anyhow!("Unknown Service: {}", name).into());
      },
    };

    service.load_app_config(config, prefix)?;
    Ok(service)
  }

  /// Load the services listed in `<prefix>.services`.
  pub fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()> {
    let mut loaded = HashSet::new();
    let list = config.get_array(&format!("{}.services", prefix))?
      .ok_or_else(|| anyhow::anyhow!("missing list of services: {}.services", prefix))?;
    for name in list.into_iter() {
      let name = name.into_string()?;
      info!("Loading {}Service config", name);
      if !loaded.insert(name.clone()) {
        return Err(anyhow::anyhow!("can't load service multiple times: {}", name).into());
      }
      let service = self.load_service(&name, config, prefix)?;
      self.services.push(service);
    }
    Ok(())
  }

  /// Setup Service endpoints.
  pub fn web_config(&self, web: &mut web::ServiceConfig) {
    // Store for this worker.
    web.app_data(self.store.worker_store());
    web.app_data(web::Data::new(self.keys.clone()));

    for service in self.services.iter() {
      service.web_config(web);
    }
  }
}

pub fn config_services(config: &AppConfig, prefix: &str) -> Result<Services> {
  let db_url = config.get_str("db.url")?
    .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;
  let keys = SessionKeys::from_config(config)?;
  let mut services = Services::new(StoreConfig::from_url(&db_url), keys);
  services.load_app_config(config, prefix)?;
  Ok(services)
}
