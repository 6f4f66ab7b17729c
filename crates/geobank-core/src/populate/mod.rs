// crates/geobank-core/src/populate/mod.rs

//! # Population Orchestrator
//!
//! Runs the stages in dependency order:
//!
//! 1. languages, currencies (reference document)
//! 2. countries, then their neighbours
//! 3. regions, cities
//! 4. flags
//! 5. translations
//!
//! A failing stage is logged and reported; later stages still run with
//! whatever is already in the store. The run is idempotent: a second run
//! over the same sources leaves the store as it was.

use crate::config::PopulateConfig;
use crate::error::Result;
use crate::fetch::{Fetcher, Transport};
use crate::resolve::CountryIndex;
use crate::store::EntityStore;
use std::fmt;
use tracing::{error, info};

mod geography;
mod reference;
mod translations;

pub use geography::{
    populate_cities, populate_countries, populate_regions, update_neighbors, CountryStage,
    PendingNeighbors,
};
pub use reference::{populate_currencies, populate_flags, populate_languages};
pub use translations::translate_entities;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Languages,
    Currencies,
    Countries,
    Neighbors,
    Regions,
    Cities,
    Flags,
    Translations,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Languages,
        Stage::Currencies,
        Stage::Countries,
        Stage::Neighbors,
        Stage::Regions,
        Stage::Cities,
        Stage::Flags,
        Stage::Translations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Languages => "languages",
            Stage::Currencies => "currencies",
            Stage::Countries => "countries",
            Stage::Neighbors => "neighbors",
            Stage::Regions => "regions",
            Stage::Cities => "cities",
            Stage::Flags => "flags",
            Stage::Translations => "translations",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows a stage wrote and input records it could not use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    pub written: usize,
    pub skipped: usize,
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written, {} skipped", self.written, self.skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Completed(StageSummary),
    Failed(String),
    /// Not attempted because an input it needs was not produced.
    Skipped,
}

/// Per-stage outcome of one run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub stages: Vec<(Stage, StageStatus)>,
}

impl PopulateReport {
    pub fn status(&self, stage: Stage) -> Option<&StageStatus> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, status)| status)
    }

    pub fn summary(&self, stage: Stage) -> Option<StageSummary> {
        match self.status(stage) {
            Some(StageStatus::Completed(summary)) => Some(*summary),
            _ => None,
        }
    }

    pub fn failed(&self) -> impl Iterator<Item = (Stage, &str)> {
        self.stages.iter().filter_map(|(stage, status)| match status {
            StageStatus::Failed(msg) => Some((*stage, msg.as_str())),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.stages
            .iter()
            .all(|(_, status)| matches!(status, StageStatus::Completed(_)))
    }

    fn record<R>(
        &mut self,
        stage: Stage,
        result: Result<R>,
        summarize: impl FnOnce(&R) -> StageSummary,
    ) -> Option<R> {
        match result {
            Ok(value) => {
                let summary = summarize(&value);
                info!("Stage {stage} completed: {summary}");
                self.stages.push((stage, StageStatus::Completed(summary)));
                Some(value)
            }
            Err(e) => {
                error!("Stage {stage} failed: {e}");
                self.stages.push((stage, StageStatus::Failed(e.to_string())));
                None
            }
        }
    }
}

impl fmt::Display for PopulateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stage, status) in &self.stages {
            match status {
                StageStatus::Completed(summary) => writeln!(f, "{stage:<13} ok      {summary}")?,
                StageStatus::Failed(msg) => writeln!(f, "{stage:<13} FAILED  {msg}")?,
                StageStatus::Skipped => writeln!(f, "{stage:<13} skipped")?,
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ORCHESTRATOR
// -----------------------------------------------------------------------------

/// Binds a store, a fetcher and a config for one or more runs.
pub struct Populator<'a, S: ?Sized, T> {
    store: &'a mut S,
    fetcher: Fetcher<T>,
    config: PopulateConfig,
}

impl<'a, S, T> Populator<'a, S, T>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    /// Fails only on an invalid config; stage failures go into the report.
    pub fn new(store: &'a mut S, transport: T, config: PopulateConfig) -> Result<Self> {
        config.validate()?;
        let fetcher =
            Fetcher::new(transport, config.retry).with_download_dir(config.download_dir.clone());
        Ok(Self {
            store,
            fetcher,
            config,
        })
    }

    pub fn config(&self) -> &PopulateConfig {
        &self.config
    }

    pub fn run(&mut self) -> PopulateReport {
        let store = &mut *self.store;
        let fetcher = &self.fetcher;
        let config = &self.config;
        let sources = &config.sources;
        let mut report = PopulateReport::default();

        info!(
            "Populating (min population {}, languages {:?})",
            config.min_population, config.languages
        );

        let languages = populate_languages(store, fetcher, sources);
        report.record(Stage::Languages, languages, |s| *s);

        let currencies = populate_currencies(store, fetcher, sources);
        report.record(Stage::Currencies, currencies, |s| *s);

        let countries = populate_countries(store, fetcher, sources);
        match report.record(Stage::Countries, countries, |c| c.summary) {
            Some(stage) => {
                let neighbors = CountryIndex::build(&*store)
                    .and_then(|index| update_neighbors(store, &stage.pending_neighbors, &index));
                report.record(Stage::Neighbors, neighbors, |s| *s);
            }
            None => report.stages.push((Stage::Neighbors, StageStatus::Skipped)),
        }

        let regions = populate_regions(store, fetcher, sources);
        report.record(Stage::Regions, regions, |s| *s);

        let cities = populate_cities(store, fetcher, sources, config.min_population);
        report.record(Stage::Cities, cities, |s| *s);

        let flags = populate_flags(store, fetcher, sources);
        report.record(Stage::Flags, flags, |s| *s);

        let schema = config.translation_schema();
        let translated = translate_entities(store, fetcher, sources, &config.languages, &schema);
        report.record(Stage::Translations, translated, |t| StageSummary {
            written: t.countries + t.regions + t.cities,
            skipped: t.unsupported as usize,
        });

        match report.failed().count() {
            0 => info!("Population finished"),
            n => error!("Population finished with {n} failed stage(s)"),
        }
        report
    }
}

/// One complete run over `store`.
pub fn populate<S, T>(store: &mut S, transport: T, config: PopulateConfig) -> Result<PopulateReport>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    Ok(Populator::new(store, transport, config)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lookups() {
        let mut report = PopulateReport::default();
        report.record(Stage::Languages, Ok(StageSummary { written: 3, skipped: 0 }), |s| *s);
        report.record::<StageSummary>(
            Stage::Currencies,
            Err(crate::GeoError::InvalidData("bad".into())),
            |s| *s,
        );
        report.stages.push((Stage::Neighbors, StageStatus::Skipped));

        assert_eq!(report.summary(Stage::Languages).map(|s| s.written), Some(3));
        assert_eq!(report.summary(Stage::Currencies), None);
        assert_eq!(report.status(Stage::Neighbors), Some(&StageStatus::Skipped));
        assert_eq!(report.failed().map(|(s, _)| s).collect::<Vec<_>>(), vec![Stage::Currencies]);
        assert!(!report.is_success());

        let text = report.to_string();
        assert!(text.contains("languages"));
        assert!(text.contains("FAILED"));
    }
}
