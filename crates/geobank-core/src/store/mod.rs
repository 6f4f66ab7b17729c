// crates/geobank-core/src/store/mod.rs

//! # Entity Store
//!
//! The persistence seam of the pipeline. Population stages only talk to
//! [`EntityStore`]; [`MemoryStore`] is the bundled implementation and can be
//! persisted as a compressed snapshot.

use crate::error::Result;
use crate::model::{
    CallingCode, City, Country, Currency, EntityKind, Flags, GeonameId, Language, Region,
    Translations,
};

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::CompressionMode;

/// New name values for one entity, used by [`EntityStore::bulk_update_names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUpdate {
    pub geoname_id: GeonameId,
    pub names: Translations,
}

/// Update-or-create storage keyed by natural keys.
///
/// Upserts own the scalar attributes of an entity only: on an existing row
/// they leave translations, flag URLs and the relation sets untouched, each
/// of which has its own operation.
pub trait EntityStore {
    // --- Upserts ---

    /// Keyed by `code`.
    fn upsert_language(&mut self, language: Language) -> Result<()>;

    /// Keyed by `code`.
    fn upsert_currency(&mut self, currency: Currency) -> Result<()>;

    /// Keyed by `geoname_id`. `code2` and `code3` must stay unique.
    fn upsert_country(&mut self, country: Country) -> Result<()>;

    /// Keyed by `geoname_id`. `(country, code)` must stay unique and the
    /// country must exist.
    fn upsert_region(&mut self, region: Region) -> Result<()>;

    /// Keyed by `geoname_id`. The country (and region, when set) must exist.
    fn upsert_city(&mut self, city: City) -> Result<()>;

    // --- Relation replacement ---

    /// Deletes the country's calling codes and recreates them from `codes`.
    fn replace_calling_codes(&mut self, country: GeonameId, codes: &[String]) -> Result<()>;

    /// Sets the country's languages (three-letter codes) wholesale.
    fn replace_country_languages(&mut self, country: GeonameId, languages: &[String])
        -> Result<()>;

    /// Sets the country's neighbours wholesale.
    fn replace_neighbors(&mut self, country: GeonameId, neighbors: &[GeonameId]) -> Result<()>;

    fn set_flags(&mut self, country: GeonameId, flags: &Flags) -> Result<()>;

    // --- Bulk update ---

    /// Writes exactly the language-name `fields` of each entity of `kind`
    /// from its update. A field the update has no value for is left as is;
    /// every other attribute is untouched. Returns the number of rows
    /// written; ids with no row are ignored.
    fn bulk_update_names(
        &mut self,
        kind: EntityKind,
        updates: &[NameUpdate],
        fields: &[String],
    ) -> Result<usize>;

    // --- Queries ---

    fn languages(&self) -> Result<Vec<Language>>;
    fn currencies(&self) -> Result<Vec<Currency>>;
    fn countries(&self) -> Result<Vec<Country>>;
    fn regions(&self) -> Result<Vec<Region>>;
    fn cities(&self) -> Result<Vec<City>>;
    fn calling_codes(&self, country: GeonameId) -> Result<Vec<CallingCode>>;
    fn country_by_code2(&self, code2: &str) -> Result<Option<Country>>;
}
