use log::*;

use actix_rt::System;

use crate::{
  error::*,
  app::*,
  db::schema,
};

/// Apply the bundled schema to `db.url`.
pub fn execute(config: AppConfig) -> Result<()> {
  let db_url = config.get_str("db.url")?
    .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;
  if db_url.starts_with("memory:") {
    info!("db.url is the in-memory store, nothing to migrate.");
    return Ok(());
  }

  let sys = System::new();
  sys.block_on(schema::migrate(&db_url))
}
