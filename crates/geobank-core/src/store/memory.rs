// crates/geobank-core/src/store/memory.rs
use super::{EntityStore, NameUpdate};
use crate::error::{GeoError, Result};
use crate::model::{
    CallingCode, City, Country, Currency, DbStats, EntityKind, Flags, GeonameId, Language,
    Region, Translations,
};
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory [`EntityStore`].
///
/// Every table is a `BTreeMap` on its natural key, so two stores holding
/// the same data compare equal and serialize to identical bytes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    languages: BTreeMap<String, Language>,
    currencies: BTreeMap<String, Currency>,
    countries: BTreeMap<GeonameId, Country>,
    regions: BTreeMap<GeonameId, Region>,
    cities: BTreeMap<GeonameId, City>,
    calling_codes: BTreeMap<GeonameId, Vec<CallingCode>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DbStats {
        DbStats {
            languages: self.languages.len(),
            currencies: self.currencies.len(),
            countries: self.countries.len(),
            regions: self.regions.len(),
            cities: self.cities.len(),
            calling_codes: self.calling_codes.values().map(Vec::len).sum(),
        }
    }

    pub fn country(&self, id: GeonameId) -> Option<&Country> {
        self.countries.get(&id)
    }

    pub fn region(&self, id: GeonameId) -> Option<&Region> {
        self.regions.get(&id)
    }

    pub fn city(&self, id: GeonameId) -> Option<&City> {
        self.cities.get(&id)
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.get(code)
    }

    pub fn currency(&self, code: &str) -> Option<&Currency> {
        self.currencies.get(code)
    }

    /// Finds a country by ISO2, ISO3 or (accent- and case-insensitive) name.
    pub fn find_country(&self, query: &str) -> Option<&Country> {
        let q = query.trim();
        self.countries
            .values()
            .find(|c| c.code2.eq_ignore_ascii_case(q) || c.code3.eq_ignore_ascii_case(q))
            .or_else(|| {
                let folded = fold_key(q);
                self.countries.values().find(|c| fold_key(&c.name) == folded)
            })
    }

    pub fn regions_of(&self, country: GeonameId) -> impl Iterator<Item = &Region> {
        self.regions.values().filter(move |r| r.country == country)
    }

    pub fn cities_of(&self, country: GeonameId) -> impl Iterator<Item = &City> {
        self.cities.values().filter(move |c| c.country == country)
    }

    fn country_mut(&mut self, id: GeonameId) -> Result<&mut Country> {
        self.countries
            .get_mut(&id)
            .ok_or_else(|| GeoError::Store(format!("country {id} does not exist")))
    }

    fn names_mut(&mut self, kind: EntityKind, id: GeonameId) -> Option<&mut Translations> {
        match kind {
            EntityKind::Country => self.countries.get_mut(&id).map(|e| &mut e.translations),
            EntityKind::Region => self.regions.get_mut(&id).map(|e| &mut e.translations),
            EntityKind::City => self.cities.get_mut(&id).map(|e| &mut e.translations),
        }
    }
}

impl EntityStore for MemoryStore {
    fn upsert_language(&mut self, language: Language) -> Result<()> {
        self.languages.insert(language.code.clone(), language);
        Ok(())
    }

    fn upsert_currency(&mut self, currency: Currency) -> Result<()> {
        self.currencies.insert(currency.code.clone(), currency);
        Ok(())
    }

    fn upsert_country(&mut self, country: Country) -> Result<()> {
        if country.code2.is_empty() || country.code3.is_empty() {
            return Err(GeoError::Store(format!(
                "country {} has an empty iso code",
                country.geoname_id
            )));
        }
        if let Some(other) = self.countries.values().find(|c| {
            c.geoname_id != country.geoname_id
                && (c.code2 == country.code2 || c.code3 == country.code3)
        }) {
            return Err(GeoError::Store(format!(
                "iso codes {}/{} of country {} already belong to country {}",
                country.code2, country.code3, country.geoname_id, other.geoname_id
            )));
        }

        match self.countries.get_mut(&country.geoname_id) {
            Some(existing) => {
                let Country {
                    code2,
                    code3,
                    name,
                    name_ascii,
                    fips,
                    continent,
                    capital,
                    population,
                    tld,
                    postal_code_format,
                    postal_code_regex,
                    currency,
                    active,
                    ..
                } = country;
                existing.code2 = code2;
                existing.code3 = code3;
                existing.name = name;
                existing.name_ascii = name_ascii;
                existing.fips = fips;
                existing.continent = continent;
                existing.capital = capital;
                existing.population = population;
                existing.tld = tld;
                existing.postal_code_format = postal_code_format;
                existing.postal_code_regex = postal_code_regex;
                existing.currency = currency;
                existing.active = active;
            }
            None => {
                self.countries.insert(country.geoname_id, country);
            }
        }
        Ok(())
    }

    fn upsert_region(&mut self, region: Region) -> Result<()> {
        if !self.countries.contains_key(&region.country) {
            return Err(GeoError::Store(format!(
                "region {} references missing country {}",
                region.geoname_id, region.country
            )));
        }
        if let Some(other) = self.regions.values().find(|r| {
            r.geoname_id != region.geoname_id
                && r.country == region.country
                && r.code == region.code
        }) {
            return Err(GeoError::Store(format!(
                "region code {} of country {} already belongs to region {}",
                region.code, region.country, other.geoname_id
            )));
        }

        match self.regions.get_mut(&region.geoname_id) {
            Some(existing) => {
                existing.country = region.country;
                existing.code = region.code;
                existing.name = region.name;
                existing.name_ascii = region.name_ascii;
            }
            None => {
                self.regions.insert(region.geoname_id, region);
            }
        }
        Ok(())
    }

    fn upsert_city(&mut self, city: City) -> Result<()> {
        if !self.countries.contains_key(&city.country) {
            return Err(GeoError::Store(format!(
                "city {} references missing country {}",
                city.geoname_id, city.country
            )));
        }
        if let Some(region) = city.region {
            if !self.regions.contains_key(&region) {
                return Err(GeoError::Store(format!(
                    "city {} references missing region {region}",
                    city.geoname_id
                )));
            }
        }

        match self.cities.get_mut(&city.geoname_id) {
            Some(existing) => {
                let translations = std::mem::take(&mut existing.translations);
                *existing = City {
                    translations,
                    ..city
                };
            }
            None => {
                self.cities.insert(city.geoname_id, city);
            }
        }
        Ok(())
    }

    fn replace_calling_codes(&mut self, country: GeonameId, codes: &[String]) -> Result<()> {
        self.country_mut(country)?;
        let rows = codes
            .iter()
            .map(|code| CallingCode {
                country,
                code: code.clone(),
            })
            .collect();
        self.calling_codes.insert(country, rows);
        Ok(())
    }

    fn replace_country_languages(
        &mut self,
        country: GeonameId,
        languages: &[String],
    ) -> Result<()> {
        if let Some(missing) = languages.iter().find(|l| !self.languages.contains_key(*l)) {
            return Err(GeoError::Store(format!("language {missing} does not exist")));
        }
        let mut set = languages.to_vec();
        set.sort();
        set.dedup();
        self.country_mut(country)?.languages = set;
        Ok(())
    }

    fn replace_neighbors(&mut self, country: GeonameId, neighbors: &[GeonameId]) -> Result<()> {
        if let Some(missing) = neighbors.iter().find(|n| !self.countries.contains_key(*n)) {
            return Err(GeoError::Store(format!("country {missing} does not exist")));
        }
        let mut set = neighbors.to_vec();
        set.sort_unstable();
        set.dedup();
        self.country_mut(country)?.neighbors = set;
        Ok(())
    }

    fn set_flags(&mut self, country: GeonameId, flags: &Flags) -> Result<()> {
        let c = self.country_mut(country)?;
        c.flag_png = flags.png.clone();
        c.flag_svg = flags.svg.clone();
        Ok(())
    }

    fn bulk_update_names(
        &mut self,
        kind: EntityKind,
        updates: &[NameUpdate],
        fields: &[String],
    ) -> Result<usize> {
        let mut written = 0;
        for update in updates {
            let Some(names) = self.names_mut(kind, update.geoname_id) else {
                continue;
            };
            for field in fields {
                if let Some(value) = update.names.get(field) {
                    names.insert(field.clone(), value.clone());
                }
            }
            written += 1;
        }
        Ok(written)
    }

    fn languages(&self) -> Result<Vec<Language>> {
        Ok(self.languages.values().cloned().collect())
    }

    fn currencies(&self) -> Result<Vec<Currency>> {
        Ok(self.currencies.values().cloned().collect())
    }

    fn countries(&self) -> Result<Vec<Country>> {
        Ok(self.countries.values().cloned().collect())
    }

    fn regions(&self) -> Result<Vec<Region>> {
        Ok(self.regions.values().cloned().collect())
    }

    fn cities(&self) -> Result<Vec<City>> {
        Ok(self.cities.values().cloned().collect())
    }

    fn calling_codes(&self, country: GeonameId) -> Result<Vec<CallingCode>> {
        Ok(self.calling_codes.get(&country).cloned().unwrap_or_default())
    }

    fn country_by_code2(&self, code2: &str) -> Result<Option<Country>> {
        Ok(self.countries.values().find(|c| c.code2 == code2).cloned())
    }
}
