pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod countdown;
pub mod datetime;
pub mod error;
pub mod form;
pub mod locale;
pub mod model;
pub mod render;
pub mod screen;
pub mod store;
pub mod sync;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting taskdue CLI"
  );
  debug!(?cli.rc_overrides, "rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .iter()
      .map(|kv| {
        (kv.key.clone(), kv.value.clone())
      })
  )?;

  let data_path =
    config::resolve_data_path(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data file"
    )?;

  let store =
    store::SnapshotStore::open(
      &data_path
    )
    .with_context(|| {
      format!(
        "failed to open snapshot at {}",
        data_path.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg);

  let now = match cli.now.as_deref() {
    | Some(raw) => {
      datetime::parse_instant(raw)
        .context("invalid --now")?
    }
    | None => Utc::now()
  };

  commands::dispatch(
    &store,
    &cfg,
    &mut renderer,
    cli.command.unwrap_or_default(),
    now
  )?;

  info!("done");
  Ok(())
}
