//! geobank: command-line interface for geobank-core
//!
//! Populates a geographic dataset (languages, currencies, countries,
//! regions, cities, flags and translations) from the geonames dumps and
//! saves it as a snapshot, then lets you inspect that snapshot.
//!
//! Usage examples
//! --------------
//!
//! - Full run with German and French translations
//!   $ geobank populate --languages de,fr
//!
//! - Region-specific languages keep their upstream case
//!   $ geobank populate --languages pt-BR,zh-CN
//!
//! - Offline run against previously downloaded dumps
//!   $ geobank populate --mirror ./dumps --min-population 5000
//!
//! - Inspect the result
//!   $ geobank stats
//!   $ geobank country FR
//!   $ geobank regions FR
//!
//! Logging follows `RUST_LOG`; `-v` switches the default to debug.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::{bail, Context};
use clap::Parser;
use geobank_core::{
    populate, CompressionMode, HttpTransport, MemoryStore, MirrorTransport, PopulateConfig,
    PopulateReport, Transport, Translatable,
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Populate {
            min_population,
            languages,
            output,
            config,
            mirror,
            download_dir,
            update,
            background,
        } => {
            let mut cfg = match config {
                Some(path) => PopulateConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => PopulateConfig::default(),
            };
            if let Some(min) = min_population {
                cfg.min_population = min;
            }
            if download_dir.is_some() {
                cfg.download_dir = download_dir;
            }
            if let Some(langs) = languages {
                cfg.languages = langs
                    .into_iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect();
            }

            let store = if update && args.input.exists() {
                MemoryStore::load_snapshot(&args.input, CompressionMode::default())?
            } else {
                MemoryStore::new()
            };

            let (store, report) = match mirror {
                Some(dir) => run_populate(store, MirrorTransport::new(dir), cfg, background)?,
                None => run_populate(store, HttpTransport::default(), cfg, background)?,
            };

            print!("{report}");
            save(&store, output.as_deref().unwrap_or(args.input.as_path()))?;
            print_stats(&store);

            let failed = report.failed().count();
            if failed > 0 {
                bail!("{failed} stage(s) failed, see the log above");
            }
        }

        Commands::Stats => {
            let store = load(&args.input)?;
            print_stats(&store);
        }

        Commands::Country { query } => {
            let store = load(&args.input)?;
            match store.find_country(&query) {
                Some(c) => {
                    println!("Country: {}", c.name);
                    println!("ISO2: {}", c.code2);
                    println!("ISO3: {}", c.code3);
                    println!("Geoname ID: {}", c.geoname_id);
                    println!("Capital: {}", c.capital);
                    println!("Continent: {}", c.continent);
                    println!("Population: {:?}", c.population);
                    println!("Currency: {}", c.currency.as_deref().unwrap_or("-"));
                    println!("Languages: {}", c.languages.join(", "));
                    let neighbors: Vec<&str> = c
                        .neighbors
                        .iter()
                        .filter_map(|id| store.country(*id))
                        .map(|n| n.code2.as_str())
                        .collect();
                    println!("Neighbors: {}", neighbors.join(", "));
                    println!("Flag: {}", c.flag_svg.as_deref().unwrap_or("-"));
                    println!("Regions: {}", store.regions_of(c.geoname_id).count());
                    println!("Cities: {}", store.cities_of(c.geoname_id).count());
                    for lang in c.translations().keys() {
                        println!("  [{lang}] {}", c.name_in(lang));
                    }
                }
                None => {
                    eprintln!("No country found for: {query}");
                }
            }
        }

        Commands::Regions { iso2 } => {
            let store = load(&args.input)?;
            match store.find_country(&iso2) {
                Some(c) => {
                    println!("Regions in {}:", c.name);
                    for r in store.regions_of(c.geoname_id) {
                        println!("- {} ({})", r.name, r.code);
                    }
                }
                None => eprintln!("Country {iso2} not found"),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Runs the pipeline, on a worker thread when `background` is set.
fn run_populate<T>(
    mut store: MemoryStore,
    transport: T,
    config: PopulateConfig,
    background: bool,
) -> anyhow::Result<(MemoryStore, PopulateReport)>
where
    T: Transport + Send + 'static,
{
    if !background {
        let report = populate(&mut store, transport, config)?;
        return Ok((store, report));
    }

    info!("Running population on a worker thread");
    let handle = std::thread::Builder::new()
        .name("geobank-populate".into())
        .spawn(move || -> geobank_core::Result<_> {
            let report = populate(&mut store, transport, config)?;
            Ok((store, report))
        })
        .context("spawning the population thread")?;

    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => bail!("population thread panicked"),
    }
}

fn load(path: &Path) -> anyhow::Result<MemoryStore> {
    MemoryStore::load_snapshot(path, CompressionMode::default())
        .with_context(|| format!("run `geobank populate` first to create {}", path.display()))
}

fn save(store: &MemoryStore, path: &Path) -> anyhow::Result<()> {
    store
        .save_snapshot(path, CompressionMode::default())
        .with_context(|| format!("saving snapshot to {}", path.display()))?;
    info!("Snapshot written to {}", path.display());
    Ok(())
}

fn print_stats(store: &MemoryStore) {
    let stats = store.stats();
    println!("Database statistics:");
    println!("  Languages: {}", stats.languages);
    println!("  Currencies: {}", stats.currencies);
    println!("  Countries: {}", stats.countries);
    println!("  Regions: {}", stats.regions);
    println!("  Cities: {}", stats.cities);
    println!("  Calling codes: {}", stats.calling_codes);
}
