use dotenv::dotenv;

use clap::{Parser, Subcommand};

use blogsite::{app::*, error::*};

/// Multi-user blogging site.
#[derive(Parser, Debug)]
#[command(name = "blogsite", version, long_about = None)]
struct Cli {
  /// Config file, replaces conf/$RUN_MODE and APP_* overrides.
  #[arg(short, long)]
  config: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the configured web servers.
  Serve,
  /// Create the database schema.
  Migrate,
}

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = Cli::parse();

  let config = AppConfig::load(cli.config.as_deref())?;

  match cli.command {
    Some(Command::Migrate) => migrate::execute(config)?,
    // default to 'serve' command.
    Some(Command::Serve) | None => serve::execute(config)?,
  }
  log::info!("Main finished");
  Ok(())
}
