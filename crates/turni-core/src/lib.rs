pub mod calendar;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod format;
pub mod hours;
pub mod locale;
pub mod render;
pub mod schedule;
pub mod store;
pub mod summary;
pub mod timeline;

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
    "starting turni CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.turnirc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  )?;

  let locale = cfg.locale();
  let clock =
    clock::Clock::from_config(&cfg);
  let now = clock.now_local();
  debug!(
    ?locale,
    timezone = %clock.timezone(),
    %now,
    "resolved locale and clock"
  );

  let data_dir = cfg
    .data_dir(cli.data.as_deref())
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    store::HistoryStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open history store \
         at {}",
        data_dir.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg);

  let mut ctx =
    commands::CommandContext {
      store: &store,
      cfg: &cfg,
      renderer: &mut renderer,
      labels: locale.labels(),
      now
    };
  commands::dispatch(
    &mut ctx,
    cli.command
  )?;

  info!("done");
  Ok(())
}
