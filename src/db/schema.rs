use log::*;

use tokio_postgres::{connect, NoTls};

use crate::error::*;

pub static SCHEMA: &'static str = include_str!("../../sql/schema.sql");

/// Create any missing tables and indexes.
pub async fn migrate(db_url: &str) -> Result<()> {
  let (cl, conn) = connect(db_url, NoTls).await?;
  actix_rt::spawn(async move {
    if let Err(e) = conn.await {
      error!("migrate: connection error: {}", e);
    }
  });
  info!("migrate: applying schema.");
  cl.batch_execute(SCHEMA).await?;
  info!("migrate: done.");
  Ok(())
}
