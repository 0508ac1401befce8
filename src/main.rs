use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode, WriteLogger};

use sysstat::sampler::{Sampler, SamplerConfig};
use sysstat::triggers::TriggersEmitter;

/// Periodically logs CPU, disk, network, memory and filesystem statistics
#[derive(Parser, Debug)]
#[command(name = "sysstat", version)]
struct Args {
    /// Block device to sample, as named in /proc/diskstats. May be repeated.
    #[arg(long = "dev", value_name = "NAME", default_value = "sda")]
    devs: Vec<String>,

    /// Network interface to sample, as named in /proc/net/dev. May be repeated.
    #[arg(long = "iface", value_name = "NAME")]
    ifaces: Vec<String>,

    /// Mount point of a filesystem whose capacity to sample. May be repeated.
    #[arg(long = "fs", value_name = "PATH")]
    filesystems: Vec<PathBuf>,

    /// Time between two samples, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Append logs to this file instead of the terminal
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("{:?}", e);
        std::process::exit(2);
    }

    setup_panic_logging();

    if let Err(e) = run(args) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = SamplerConfig {
        dev_names: args.devs,
        iface_names: args.ifaces,
        fs_paths: args.filesystems,
    };

    let sampler = Sampler::new(&config).context("Could not initialize statistics readers")?;

    let (tx, rx) = channel();
    TriggersEmitter::launch_async(tx, Duration::from_secs(args.interval));

    info!("Sampling every {}s", args.interval);
    sampler.run(rx).context("Sampling stopped")?;
    info!("Exiting");

    Ok(())
}

fn setup_panic_logging() {
    // As panics are erased by the application exiting, log the panic as an error
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        error!("Panic occured: {:?}", info);
        default_hook(info);
    }))
}

fn init_logging(args: &Args) -> Result<()> {
    match &args.log_file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .with_context(|| format!("Could not open log file {:?}", path))?;

            WriteLogger::init(args.log_level, Config::default(), log_file)
        }
        None => TermLogger::init(args.log_level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
    }
    .context("Could not initialize logging")
}
