use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use docket_server::{
  AppState,
  router
};
use tokio::net::TcpListener;
use tracing::{
  error,
  info,
  warn
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{
  EnvFilter,
  fmt
};

#[derive(Parser, Debug)]
#[command(
  name = "docket-server",
  version,
  about = "Mock task backend for docket"
)]
struct Args {
  #[arg(
    long,
    env = "DOCKET_HOST",
    default_value = "127.0.0.1"
  )]
  host: String,

  #[arg(
    long,
    env = "DOCKET_PORT",
    default_value_t = 3001
  )]
  port: u16
}

fn init_tracing() {
  let filter =
    EnvFilter::try_from_default_env()
      .or_else(|_| {
        EnvFilter::try_new(
          "info,docket_server=debug,\
           tower_http=debug"
        )
      })
      .unwrap_or_else(|_| {
        EnvFilter::new("info")
      });

  let _ =
    tracing_subscriber::registry()
      .with(filter)
      .with(
        fmt::layer()
          .with_target(true)
          .with_line_number(true)
      )
      .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  let args = Args::parse();

  let addr: SocketAddr =
    format!("{}:{}", args.host, args.port)
      .parse()
      .with_context(|| {
        format!(
          "invalid listen address {}:{}",
          args.host, args.port
        )
      })?;

  let listener = TcpListener::bind(addr)
    .await
    .with_context(|| {
      format!("failed to bind {addr}")
    })?;
  info!(%addr, "docket mock server listening");

  axum::serve(
    listener,
    router(AppState::seeded())
  )
  .with_graceful_shutdown(
    wait_for_shutdown_signal()
  )
  .await
  .context("server error")?;

  warn!("server stopped");
  Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
  use tokio::signal::unix::{
    SignalKind,
    signal
  };

  let mut sigint = match signal(
    SignalKind::interrupt()
  ) {
    | Ok(stream) => stream,
    | Err(error) => {
      error!(
        %error,
        "failed to register SIGINT \
         handler; falling back to \
         ctrl_c"
      );
      let _ =
        tokio::signal::ctrl_c().await;
      return;
    }
  };

  let mut sigterm = match signal(
    SignalKind::terminate()
  ) {
    | Ok(stream) => stream,
    | Err(error) => {
      error!(
        %error,
        "failed to register SIGTERM \
         handler; falling back to \
         ctrl_c"
      );
      let _ =
        tokio::signal::ctrl_c().await;
      return;
    }
  };

  tokio::select! {
    _ = sigint.recv() => {}
    _ = sigterm.recv() => {}
  }
  info!("shutdown signal received");
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
  if let Err(error) =
    tokio::signal::ctrl_c().await
  {
    error!(%error, "failed to listen for ctrl_c");
  }
}
