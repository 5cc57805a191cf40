// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use ietfbib::{path::default_config_path, BibliographyBuilder, BuilderConfig, KeyStore};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  ietfbib [options] <ietfbib-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Build(opts) => run_build(opts),
            Command::Forget(opts) => run_forget(opts),
            Command::List(opts) => run_list(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate bibliography of IETF documents cited by source documents.
    #[command(override_usage = "ietfbib build [options] [<source>]...")]
    Build(BuildOptions),

    /// Remove citation keys from record store.
    #[command(override_usage = "ietfbib forget [options] <key>...")]
    Forget(ForgetOptions),

    /// List citation keys in record store.
    #[command(override_usage = "ietfbib list [options]")]
    List(ListOptions),
}

#[derive(Args, Clone, Debug)]
struct CommonOptions {
    /// Path to configuration file.
    #[arg(short, long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to record store file.
    #[arg(short, long, value_name = "path")]
    pub store: Option<PathBuf>,
}

impl CommonOptions {
    fn load_config(&self) -> Result<BuilderConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let mut config = BuilderConfig::load(path)?;
        if let Some(store) = &self.store {
            config.output.store = store.clone();
        }

        Ok(config)
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BuildOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Path to bibliography file to write.
    #[arg(short, long, value_name = "path")]
    pub output: Option<PathBuf>,

    /// Source documents to scan, defaults to every document in source directory.
    #[arg(value_name = "source")]
    pub sources: Vec<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ForgetOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Citation keys to remove.
    #[arg(required = true, value_name = "key")]
    pub keys: Vec<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    #[command(flatten)]
    pub common: CommonOptions,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_build(opts: BuildOptions) -> Result<()> {
    let mut config = opts.common.load_config()?;
    if let Some(output) = opts.output {
        config.output.bibliography = output;
    }

    let mut builder = BibliographyBuilder::over_http(config)?;
    let report = builder.build(&opts.sources)?;
    info!(
        "{} cached, {} fetched, {} not IETF references",
        report.cached, report.fetched, report.unrecognized
    );

    Ok(())
}

fn run_forget(opts: ForgetOptions) -> Result<()> {
    let config = opts.common.load_config()?;
    let mut store = KeyStore::load(&config.output.store);
    for key in &opts.keys {
        match store.remove(key) {
            Some(_) => info!("forget {key}"),
            None => warn!("no record stored for {key}"),
        }
    }
    store.save()?;

    Ok(())
}

fn run_list(opts: ListOptions) -> Result<()> {
    let config = opts.common.load_config()?;
    let store = KeyStore::load(&config.output.store);
    info!("{} records in {:?}", store.len(), store.path().display());
    for key in store.keys() {
        let record = store.get(key)?;
        println!("{key}\t{}", record.canonical_key);
    }

    Ok(())
}
