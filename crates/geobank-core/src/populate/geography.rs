// crates/geobank-core/src/populate/geography.rs
use super::StageSummary;
use crate::config::Sources;
use crate::error::Result;
use crate::fetch::{Fetcher, Transport};
use crate::model::{City, Country, Region, Translations};
use crate::parse::{
    parse_language_tags, parse_tsv, ArchiveSource, CityFormat, CountryFormat, RegionFormat,
};
use crate::resolve::{CountryIndex, CurrencyIndex, LanguageIndex, RegionIndex};
use crate::store::EntityStore;
use crate::text::to_ascii;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Raw neighbour code lists by country ISO2, collected while populating
/// countries and resolved once every country exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingNeighbors {
    by_code2: BTreeMap<String, String>,
}

impl PendingNeighbors {
    pub fn insert(&mut self, code2: impl Into<String>, neighbors: impl Into<String>) {
        self.by_code2.insert(code2.into(), neighbors.into());
    }

    pub fn len(&self) -> usize {
        self.by_code2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code2.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_code2.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// What the countries stage hands to the neighbours stage.
#[derive(Debug, Clone, Default)]
pub struct CountryStage {
    pub summary: StageSummary,
    pub pending_neighbors: PendingNeighbors,
}

// -----------------------------------------------------------------------------
// COUNTRIES
// -----------------------------------------------------------------------------

/// Upserts every country of the country dump with its currency, calling
/// codes and languages. Neighbours are only collected here.
pub fn populate_countries<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
) -> Result<CountryStage>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating countries...");
    let bytes = fetcher.fetch_bytes(&sources.country_info_url)?;

    let currencies = CurrencyIndex::build(&*store)?;
    let languages = LanguageIndex::build(&*store)?;

    let mut stage = CountryStage::default();
    let mut rows = parse_tsv(&bytes, CountryFormat);

    for row in rows.by_ref() {
        let row = row?;
        let geoname_id = row.geoname_id;

        store.upsert_country(Country {
            geoname_id,
            name_ascii: to_ascii(&row.name),
            name: row.name,
            code2: row.code2.clone(),
            code3: row.code3,
            fips: row.fips,
            continent: row.continent,
            capital: row.capital,
            population: row.population,
            tld: row.tld,
            postal_code_format: row.postal_code_format,
            postal_code_regex: row.postal_code_regex,
            currency: currencies.get(&row.currency_code),
            flag_png: None,
            flag_svg: None,
            active: true,
            languages: Vec::new(),
            neighbors: Vec::new(),
            translations: Translations::new(),
        })?;

        store.replace_calling_codes(geoname_id, &row.calling_codes)?;

        let mut codes: Vec<String> = Vec::new();
        for tag in parse_language_tags(&row.languages) {
            if let Some(code) = languages.get(&tag) {
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
        }
        store.replace_country_languages(geoname_id, &codes)?;

        stage.pending_neighbors.insert(row.code2, row.neighbors);
        stage.summary.written += 1;
    }

    stage.summary.skipped = rows.stats().malformed() as usize;
    debug!("country dump: {}", rows.stats());
    Ok(stage)
}

/// Second pass: resolves the collected neighbour codes, dropping unknown
/// ones, and sets each country's neighbour relation.
pub fn update_neighbors<S>(
    store: &mut S,
    pending: &PendingNeighbors,
    countries: &CountryIndex,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
{
    info!("Updating country neighbors...");
    let mut summary = StageSummary::default();
    for (code2, neighbor_codes) in pending.iter() {
        let Some(country) = countries.get(code2) else {
            summary.skipped += 1;
            continue;
        };
        let neighbors = countries.resolve_list(neighbor_codes);
        store.replace_neighbors(country, &neighbors)?;
        summary.written += 1;
    }
    Ok(summary)
}

// -----------------------------------------------------------------------------
// REGIONS & CITIES
// -----------------------------------------------------------------------------

/// Upserts admin-1 regions whose country is known.
pub fn populate_regions<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating regions...");
    let bytes = fetcher.fetch_bytes(&sources.admin1_url)?;
    let countries = CountryIndex::build(&*store)?;

    let mut summary = StageSummary::default();
    let mut rows = parse_tsv(&bytes, RegionFormat);
    for row in rows.by_ref() {
        let row = row?;
        let Some(country) = countries.get(&row.country_code) else {
            summary.skipped += 1;
            continue;
        };
        store.upsert_region(Region {
            geoname_id: row.geoname_id,
            country,
            code: row.region_code,
            name: row.name,
            name_ascii: row.name_ascii,
            translations: Translations::new(),
        })?;
        summary.written += 1;
    }

    summary.skipped += rows.stats().malformed() as usize;
    debug!("admin1 dump: {}", rows.stats());
    Ok(summary)
}

/// Upserts cities with `population >= min_population`.
///
/// A city whose country is unknown is skipped; one whose region is unknown
/// is stored without a region.
pub fn populate_cities<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
    min_population: u32,
) -> Result<StageSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Populating cities (population >= {min_population})...");
    let (url, entry) = sources.cities_dump(min_population);
    let bytes = fetcher.fetch_bytes(&url)?;

    let countries = CountryIndex::build(&*store)?;
    let regions = RegionIndex::build(&*store)?;

    let mut archive = ArchiveSource::from_bytes(&bytes)?;
    let mut rows = archive.records(&entry, CityFormat::new(min_population))?;

    let mut summary = StageSummary::default();
    let mut without_region = 0usize;
    for row in rows.by_ref() {
        let row = row?;
        let Some(country) = countries.get(&row.country_code) else {
            summary.skipped += 1;
            continue;
        };
        let region = if row.region_code.is_empty() {
            None
        } else {
            regions.get(&row.country_code, &row.region_code)
        };
        if region.is_none() {
            without_region += 1;
        }

        store.upsert_city(City {
            geoname_id: row.geoname_id,
            country,
            region,
            name: row.name,
            name_ascii: row.name_ascii,
            latitude: row.latitude,
            longitude: row.longitude,
            population: row.population,
            timezone: row.timezone,
            translations: Translations::new(),
        })?;
        summary.written += 1;
    }

    summary.skipped += rows.stats().malformed() as usize;
    debug!("{entry}: {}, {without_region} without region", rows.stats());
    Ok(summary)
}
