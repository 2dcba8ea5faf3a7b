pub mod cli;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod datastore;
pub mod datetime;
pub mod filter;
pub mod render;
pub mod schema;
pub mod store;
pub mod task;

use std::ffi::OsString;

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
    "starting taskpad"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let blob =
    datastore::FileBlobStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open data \
         directory {}",
        data_dir.display()
      )
    })?;
  let mut store =
    store::TaskStore::load(blob);

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    &mut store,
    &cfg,
    &renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
