pub mod board;
pub mod bulk;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod engine;
pub mod filter;
pub mod pagination;
pub mod render;
pub mod selection;
pub mod shell;
pub mod source;
pub mod validate;
pub mod view;

use std::ffi::OsString;
use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting docket CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.docketrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .chain(
        cli
          .server
          .map(|url| ("server.url".to_string(), url))
      )
  );

  let timeout = Duration::from_secs(
    cfg.get_u64("http.timeout")?.unwrap_or(30)
  );
  let source =
    source::HttpDataSource::new(
      &cfg.server_url(),
      timeout
    )?;
  let cache = cache::QueryCache::new(
    cfg.get_u64("cache.max_age")?.unwrap_or(0)
  );

  let mut engine =
    engine::TaskListEngine::new(
      cfg.page_size()?
    );
  if let Some(layout) = cfg.get("layout") {
    engine.set_layout(layout.parse()?);
  }

  let renderer = render::Renderer::new(&cfg)?;
  let mut board = board::TaskBoard::new(
    source,
    cache,
    engine,
    *renderer.timezone()
  );

  let command = cli.command.unwrap_or(
    cli::Command::List(
      cli::ListArgs::default()
    )
  );

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  let stdin = io::stdin();
  let mut stdout = io::stdout().lock();
  runtime.block_on(commands::dispatch(
    &mut board,
    &renderer,
    command,
    stdin.lock(),
    &mut stdout
  ))?;

  info!("done");
  Ok(())
}
