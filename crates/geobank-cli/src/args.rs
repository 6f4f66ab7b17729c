use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for geobank
#[derive(Debug, Parser)]
#[command(
    name = "geobank",
    version,
    about = "Populate and inspect a cross-referenced geographic dataset built from geonames dumps"
)]
pub struct CliArgs {
    /// Snapshot file to read or write (default: geobank.bin)
    #[arg(short = 'i', long = "input", global = true, default_value = "geobank.bin")]
    pub input: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full population pipeline and save the result as a snapshot
    Populate {
        /// Only load cities with at least this many inhabitants
        #[arg(long = "min-population")]
        min_population: Option<u32>,

        /// Comma-separated translation languages, case as in geonames (e.g. de,fr,pt-BR)
        #[arg(short = 'l', long = "languages", env = "GEOBANK_LANGUAGES", value_delimiter = ',')]
        languages: Option<Vec<String>>,

        /// Where to write the snapshot (default: the --input path)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// JSON config file; flags override its values
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Read the dumps from a local directory instead of the network
        #[arg(long = "mirror")]
        mirror: Option<PathBuf>,

        /// Directory for the temporary alternate-names download
        #[arg(long = "download-dir")]
        download_dir: Option<PathBuf>,

        /// Start from an existing snapshot at --input instead of an empty store
        #[arg(long = "update")]
        update: bool,

        /// Run the pipeline on a worker thread
        #[arg(long = "background")]
        background: bool,
    },

    /// Show a summary of the snapshot contents
    Stats,

    /// Lookup a country by ISO2, ISO3 or name
    Country {
        /// ISO2 or ISO3 code (e.g. FR, DEU) or country name
        query: String,
    },

    /// List the regions of a country
    Regions {
        /// ISO2 code of the country
        iso2: String,
    },
}
