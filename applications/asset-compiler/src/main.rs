//! Compiles the assets directory into a typed TypeScript manifest and keeps it up to date.
//!
//! Usage: `asset-compiler <config.json>`

mod watch;

use std::{path::PathBuf, sync::mpsc::channel};

use anyhow::Context;
use lib_asset_manifest::{compile_to_file, Config};
use log::{info, warn};
use pico_args::Arguments;
use watch::{Debouncer, WatchMessage};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_indent(Some(0))
        .init();

    let mut args = Arguments::from_env();
    let config_path: PathBuf = args
        .free_from_str()
        .context("usage: asset-compiler <config.json>")?;
    let unexpected = args.finish();
    if !unexpected.is_empty() {
        warn!("ignoring unexpected arguments: {unexpected:?}");
    }

    let config = Config::load(&config_path)?;

    let (sender, receiver) = channel();
    {
        let sender = sender.clone();
        ctrlc::set_handler(move || {
            if sender.send(WatchMessage::Shutdown).is_err() {
                warn!("watch loop has already exited");
            }
        })
        .context("failed to register Ctrl-C handler")?;
    }

    let mut debouncer = Debouncer::new(config.debounce);
    recompile(&config).context("initial build failed")?;
    debouncer.finished();

    let watcher = watch::start(&config.assets_dir, &config.output_file, sender)?;
    let rebuilds = watch::run(&receiver, &mut debouncer, || recompile(&config));
    drop(watcher);

    info!("exiting after {rebuilds} rebuilds");
    Ok(())
}

fn recompile(config: &Config) -> anyhow::Result<()> {
    info!("Recompiling...");
    compile_to_file(config)?;
    Ok(())
}
