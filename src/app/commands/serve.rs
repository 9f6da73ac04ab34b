use log::*;

use std::convert::TryInto;
use std::thread;
use futures::executor;

use crossbeam_channel::{
  bounded, Sender, Receiver,
};

use actix_rt::System;
use actix_files::Files;
use actix_web::{get, web, middleware, HttpResponse, App, HttpServer};

use crate::{
  error::*,
  app::*,
  db::DbService,
  middleware::Auth,
  services::config_services,
};

#[derive(Debug)]
enum StopEvent {
  Shutdown,
  StopServer,
  StopServerFinished(u32),
}

#[get("/stop")]
async fn stop_server(waiter: web::Data<ServerWaiter>) -> HttpResponse {
  info!("Got shutdown request.");
  waiter.main_shutdown();

  HttpResponse::Ok().body("Shutting down.")
}

#[derive(Clone)]
struct ServerStopper {
  id: u32,
  tx: Sender<StopEvent>,
}

#[derive(Clone)]
struct ServerWaiter {
  id: u32,
  main_tx: Sender<StopEvent>,
  rx: Receiver<StopEvent>,
}

fn send_event(tx: &Sender<StopEvent>, event: StopEvent) {
  if let Err(err) = tx.send(event) {
    error!("Failed to send stop event: {:?}", err);
  }
}

impl ServerStopper {
  pub fn new(id: u32, main_tx: Sender<StopEvent>) -> (Self, ServerWaiter) {
    let (tx, rx) = bounded(1);
    (Self{
      id,
      tx,
    }, ServerWaiter{
      id,
      main_tx,
      rx,
    })
  }

  pub fn shutdown(&self) {
    debug!("Signal server({}) to stop.", self.id);
    send_event(&self.tx, StopEvent::StopServer);
  }
}

impl ServerWaiter {
  pub fn wait_shutdown(&self) -> Result<StopEvent> {
    debug!("Server waiting for shutdown signal.");
    Ok(self.rx.recv()?)
  }

  pub fn server_stopped(&self) {
    debug!("Server stopped, let main thread know.");
    send_event(&self.main_tx, StopEvent::StopServerFinished(self.id));
  }

  pub fn main_shutdown(&self) {
    info!("Signal main thread to shutdown.");
    send_event(&self.main_tx, StopEvent::Shutdown);
  }
}

struct MainStopper {
  tx: Sender<StopEvent>,
  rx: Receiver<StopEvent>,
  servers: Vec<ServerStopper>,
}

impl MainStopper {
  pub fn new() -> Self {
    let (tx, rx) = bounded(1);
    Self { tx, rx,
      servers: Vec::new(),
    }
  }

  pub fn new_server(&mut self) -> ServerWaiter {
    let id = self.servers.len();
    let (stopper, waiter) = ServerStopper::new(id as u32, self.tx.clone());
    self.servers.push(stopper);
    waiter
  }

  pub fn wait_shutdown(&self) {
    debug!("Wait for shutdown signal");
    let mut stopped_counter = 0usize;
    // wait for shutdown signal.
    while stopped_counter < self.servers.len() {
      match self.rx.recv() {
        Err(err) => {
          error!("Main thread waiter received error: {:?}", err);
          return;
        },
        Ok(StopEvent::Shutdown) => {
          info!("Got shutdown signal.  Stop servers.");
          break;
        },
        Ok(StopEvent::StopServerFinished(id)) => {
          let len = self.servers.len();
          stopped_counter += 1;
          if stopped_counter < len {
            let remain = len - stopped_counter;
            debug!("Server({}) stopped.  Remaining {}", id, remain);
          } else {
            debug!("Server({}) stopped.  All servers stopped.  Stop main thread", id);
            return;
          }
        },
        Ok(ev) => {
          error!("Main thread received invalid event: {:?}", ev);
        },
      }
    }

    // Tell the remaining servers to shutdown.
    let mut counter = self.servers.len() - stopped_counter;
    for stopper in self.servers.iter() {
      stopper.shutdown();
    }
    // Wait for them to finish.
    while counter > 0 {
      match self.rx.recv() {
        Err(err) => {
          error!("Main thread waiter received error during shutdown: {:?}", err);
          return;
        },
        Ok(StopEvent::StopServerFinished(id)) => {
          counter -= 1;
          debug!("Server({}) stopped.  Remaining {}", id, counter);
        },
        Ok(ev) => {
          debug!("Ignoring event during shutdown: {:?}", ev);
        },
      }
    }
    info!("Stopped all servers.");
  }
}

pub fn execute(config: AppConfig) -> Result<()> {
  // Stopper for main thread.
  let mut main_stopper = MainStopper::new();

  let servers = config.get_array("servers")?
    .ok_or_else(|| anyhow::anyhow!("Missing list of servers"))?;
  for server in servers.into_iter() {
    let server = server.into_string()?;
    let cfg = config.clone();
    let waiter = main_stopper.new_server();
    debug!("Spawn server: {}", server);
    thread::spawn(move || {
      if let Err(err) = run_server(&cfg, &server, waiter.clone()) {
        error!("Error from server({}): {:?}", server, err);
      }
      debug!("run_server: stopped.");
      // notify main thread that we have stopped.
      waiter.server_stopped();
    });
  }

  // wait on main stopper
  main_stopper.wait_shutdown();

  info!("main thread: stopped.");
  Ok(())
}

async fn test_db(url: String) -> Result<()> {
  let db = DbService::new(&url);
  db.prepare().await
}

fn run_server(config: &AppConfig, prefix: &str, waiter: ServerWaiter) -> Result<()> {
  let sys = System::new();

  let debug = config.get_bool("debug")?.unwrap_or(false);
  debug!("Debug = {:?}", debug);

  if debug {
    let db_url = config.get_str("db.url")?
      .ok_or_else(|| anyhow::anyhow!("db.url must be set"))?;
    if !db_url.starts_with("memory:") {
      // Test db prepared statements.
      sys.block_on(test_db(db_url))?;
    }
  }

  // configure services
  info!("Serve.Services: configure services. prefix={}", prefix);
  let services = config_services(config, prefix)?;

  // Check if stopper is enabled for this server
  let stopper = if config.get_bool(&format!("{}.stopper", prefix))?.unwrap_or_default() {
    Some(waiter.clone())
  } else {
    None
  };

  let access_log = config.get_bool(&format!("{}.access_log", prefix))?.unwrap_or(false);
  let static_dir = config.get_str(&format!("{}.static_dir", prefix))?;
  if let Some(ref dir) = static_dir {
    info!("{} serving /static from: {}", prefix, dir);
  }

  // Start http server
  let mut server = HttpServer::new(move || {
    // change default limits
    let form = web::FormConfig::default().limit(256 * 1024);

    App::new()
      .app_data(form)
      .wrap(Auth::optional())
      .wrap(middleware::DefaultHeaders::new()
        .add(("X-Frame-Options", "DENY"))
        .add(("X-Content-Type-Options", "nosniff")))
      .wrap(middleware::Compress::default())
      .wrap(middleware::Condition::new(access_log, middleware::Logger::default()))
      .configure(|web| {
        services.web_config(web);

        if let Some(ref dir) = static_dir {
          web.service(Files::new("/static", dir));
        }

        if let Some(ref stopper) = stopper {
          // Server stopper
          web.app_data(web::Data::new(stopper.clone()))
            .service(stop_server);
        }
      })
  });

  // workers
  if let Some(workers) = config.get_int(&format!("{}.workers", prefix))? {
    info!("Workers: {}", workers);
    let workers: usize = workers.try_into()
      .map_err(|_| anyhow::anyhow!("{}.workers must be > 0", prefix))?;
    server = server.workers(workers);
  }

  // listen backlog
  if let Some(backlog) = config.get_int(&format!("{}.backlog", prefix))? {
    info!("Listen backlog: {}", backlog);
    let backlog: u32 = backlog.try_into()
      .map_err(|_| anyhow::anyhow!("{}.backlog must be >= 0", prefix))?;
    server = server.backlog(backlog);
  }

  // setup binds.
  let listen = config.get_str(&format!("{}.listen", prefix))?
    .ok_or_else(|| anyhow::anyhow!("Missing {}.listen", prefix))?;
  info!("{} services listening on: {}", prefix, listen);
  server = server.bind(listen)?;

  // run server future
  let res = sys.block_on(async move {
    let server = server.run();

    let handle = server.handle();
    let shutdown = waiter.clone();
    thread::spawn(move || {
      // wait for shutdown signal.
      match shutdown.wait_shutdown() {
        Err(_) => (),
        Ok(StopEvent::StopServer) => {
          debug!("Got shutdown signal.  Stop server: {}", shutdown.id);
          executor::block_on(handle.stop(true));
        },
        Ok(ev) => {
          error!("Server waiter received invalid event: {:?}", ev);
        },
      }
    });

    server.await
  });
  Ok(res?)
}
