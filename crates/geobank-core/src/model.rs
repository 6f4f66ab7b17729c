// crates/geobank-core/src/model.rs

//! # Domain Model
//!
//! The entities written by the population pipeline. Geographic entities are
//! keyed by their upstream `geoname_id`; reference data (languages,
//! currencies) by their code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable upstream identifier of a Country, Region or City.
pub type GeonameId = u64;

/// Localized display names of one entity: language code -> name.
///
/// A `BTreeMap` keeps snapshots byte-for-byte reproducible.
pub type Translations = BTreeMap<String, String>;

/// The three entity kinds that carry translated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Country,
    Region,
    City,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Country, EntityKind::Region, EntityKind::City];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Country => "country",
            EntityKind::Region => "region",
            EntityKind::City => "city",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-2/3 three-letter code (primary key).
    pub code: String,
    /// ISO 639-1 two-letter code, empty when none exists.
    pub code2: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

/// A Country entry.
///
/// The scalar attributes are owned by the country upsert. `currency`,
/// `languages`, `neighbors`, the flag URLs and `translations` are each owned
/// by their own stage and survive re-upserts of the scalar attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub geoname_id: GeonameId,
    pub code2: String,
    pub code3: String,
    pub name: String,
    pub name_ascii: String,
    pub fips: String,
    pub continent: String,
    pub capital: String,
    pub population: Option<u64>,
    pub tld: String,
    pub postal_code_format: String,
    pub postal_code_regex: String,
    /// Currency code, `None` when the dump's code is not a known currency.
    pub currency: Option<String>,
    pub flag_png: Option<String>,
    pub flag_svg: Option<String>,
    pub active: bool,

    /// Three-letter language codes, replaced wholesale on each run.
    pub languages: Vec<String>,
    /// Neighboring countries, replaced wholesale on each run.
    pub neighbors: Vec<GeonameId>,
    pub translations: Translations,
}

/// An admin-1 subdivision (state / province / region).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub geoname_id: GeonameId,
    pub country: GeonameId,
    /// e.g. "A8" from the dump's "FR.A8".
    pub code: String,
    pub name: String,
    pub name_ascii: String,
    pub translations: Translations,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub geoname_id: GeonameId,
    pub country: GeonameId,
    /// Absent when the dump's admin-1 code did not resolve.
    pub region: Option<GeonameId>,
    pub name: String,
    pub name_ascii: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub population: Option<u64>,
    pub timezone: String,
    pub translations: Translations,
}

/// Calling codes carry no stable upstream key, so a country's set is
/// replaced as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallingCode {
    pub country: GeonameId,
    pub code: String,
}

/// Flag image URLs for one country.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub png: Option<String>,
    pub svg: Option<String>,
}

/// Common view over the translatable entities.
pub trait Translatable {
    const KIND: EntityKind;

    fn geoname_id(&self) -> GeonameId;
    fn translations(&self) -> &Translations;

    /// Display name in `lang`, falling back to the canonical name.
    fn name_in(&self, lang: &str) -> &str;
}

macro_rules! impl_translatable {
    ($ty:ty, $kind:expr) => {
        impl Translatable for $ty {
            const KIND: EntityKind = $kind;

            fn geoname_id(&self) -> GeonameId {
                self.geoname_id
            }

            fn translations(&self) -> &Translations {
                &self.translations
            }

            fn name_in(&self, lang: &str) -> &str {
                self.translations
                    .get(lang)
                    .map(String::as_str)
                    .unwrap_or(&self.name)
            }
        }
    };
}

impl_translatable!(Country, EntityKind::Country);
impl_translatable!(Region, EntityKind::Region);
impl_translatable!(City, EntityKind::City);

/// Simple aggregate statistics for a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStats {
    pub languages: usize,
    pub currencies: usize,
    pub countries: usize,
    pub regions: usize,
    pub cities: usize,
    pub calling_codes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_in_falls_back_to_canonical_name() {
        let mut region = Region {
            geoname_id: 3013736,
            country: 3017382,
            code: "A8".into(),
            name: "Alsace".into(),
            name_ascii: "Alsace".into(),
            translations: Translations::new(),
        };
        assert_eq!(region.name_in("de"), "Alsace");

        region.translations.insert("de".into(), "Elsass".into());
        assert_eq!(region.name_in("de"), "Elsass");
        assert_eq!(Region::KIND, EntityKind::Region);
    }
}
