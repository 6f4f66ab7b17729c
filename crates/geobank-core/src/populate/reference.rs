// crates/geobank-core/src/populate/reference.rs
use super::StageSummary;
use crate::config::Sources;
use crate::error::Result;
use crate::fetch::{Fetcher, Transport};
use crate::parse::{parse_reference, ReferenceData};
use crate::store::EntityStore;
use tracing::info;

fn fetch_reference<T: Transport>(fetcher: &Fetcher<T>, sources: &Sources) -> Result<ReferenceData> {
    let bytes = fetcher.fetch_bytes(&sources.rest_countries_url)?;
    parse_reference(&bytes)
}

/// Upserts every language named in the reference document, keyed by its
/// three-letter code.
pub fn populate_languages<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating languages...");
    let data = fetch_reference(fetcher, sources)?;
    let mut summary = StageSummary::default();
    for language in data.languages {
        store.upsert_language(language)?;
        summary.written += 1;
    }
    Ok(summary)
}

pub fn populate_currencies<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating currencies...");
    let data = fetch_reference(fetcher, sources)?;
    let mut summary = StageSummary::default();
    for currency in data.currencies {
        store.upsert_currency(currency)?;
        summary.written += 1;
    }
    Ok(summary)
}

/// Sets flag URLs on every stored country the reference document has flags
/// for. Countries without flag data are left unchanged.
pub fn populate_flags<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating flags...");
    let data = fetch_reference(fetcher, sources)?;
    let mut summary = StageSummary::default();
    for country in store.countries()? {
        match data.flags.get(&country.code2) {
            Some(flags) => {
                store.set_flags(country.geoname_id, flags)?;
                summary.written += 1;
            }
            None => summary.skipped += 1,
        }
    }
    Ok(summary)
}
