// crates/geobank-core/src/resolve.rs

//! # Entity Resolver
//!
//! Lookup maps used to resolve foreign keys between record kinds. Each map
//! is a snapshot of the store taken when it is built and is never updated
//! afterwards; stages rebuild the ones they need.

use crate::error::Result;
use crate::model::{EntityKind, GeonameId, Translations};
use crate::store::EntityStore;
use std::collections::{HashMap, HashSet};

/// Country geoname ids by ISO2 code.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    by_code2: HashMap<String, GeonameId>,
}

impl CountryIndex {
    pub fn build<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let by_code2 = store
            .countries()?
            .into_iter()
            .map(|c| (c.code2, c.geoname_id))
            .collect();
        Ok(Self { by_code2 })
    }

    pub fn get(&self, code2: &str) -> Option<GeonameId> {
        self.by_code2.get(code2).copied()
    }

    /// Resolves a comma-separated code list, dropping unknown codes.
    pub fn resolve_list(&self, codes: &str) -> Vec<GeonameId> {
        codes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .filter_map(|c| self.get(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_code2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code2.is_empty()
    }
}

/// Region geoname ids by `(country iso2, admin-1 code)`.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    by_code: HashMap<(String, String), GeonameId>,
}

impl RegionIndex {
    pub fn build<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let code2_of: HashMap<GeonameId, String> = store
            .countries()?
            .into_iter()
            .map(|c| (c.geoname_id, c.code2))
            .collect();

        let by_code = store
            .regions()?
            .into_iter()
            .filter_map(|r| {
                let code2 = code2_of.get(&r.country)?;
                Some(((code2.clone(), r.code), r.geoname_id))
            })
            .collect();
        Ok(Self { by_code })
    }

    pub fn get(&self, country_code: &str, region_code: &str) -> Option<GeonameId> {
        self.by_code
            .get(&(country_code.to_string(), region_code.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// Three-letter language codes by either their own code or their two-letter
/// code, so the dump's mixed-length tags resolve the same way.
#[derive(Debug, Clone, Default)]
pub struct LanguageIndex {
    by_code: HashMap<String, String>,
}

impl LanguageIndex {
    pub fn build<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let mut by_code = HashMap::new();
        for lang in store.languages()? {
            if !lang.code2.is_empty() {
                by_code.insert(lang.code2.clone(), lang.code.clone());
            }
            by_code.insert(lang.code.clone(), lang.code);
        }
        Ok(Self { by_code })
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.by_code.get(tag).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurrencyIndex {
    codes: HashSet<String>,
}

impl CurrencyIndex {
    pub fn build<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let codes = store.currencies()?.into_iter().map(|c| c.code).collect();
        Ok(Self { codes })
    }

    /// The stored code, if `code` names a known currency.
    pub fn get(&self, code: &str) -> Option<String> {
        self.codes.get(code).cloned()
    }
}

// -----------------------------------------------------------------------------
// TRANSLATION INDEX
// -----------------------------------------------------------------------------

/// What the translation stage needs to know about one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEntity {
    pub kind: EntityKind,
    /// The entity's stored names when the index was built.
    pub translations: Translations,
}

/// Every Country, Region and City by geoname id.
///
/// Built once, after all three kinds are populated. Ids are unique across
/// kinds upstream; should one repeat, the later kind (city over region over
/// country) wins.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    entities: HashMap<GeonameId, IndexedEntity>,
}

impl EntityIndex {
    pub fn build<S: EntityStore + ?Sized>(store: &S) -> Result<Self> {
        let mut index = Self::default();
        for c in store.countries()? {
            index.insert(c.geoname_id, EntityKind::Country, c.translations);
        }
        for r in store.regions()? {
            index.insert(r.geoname_id, EntityKind::Region, r.translations);
        }
        for c in store.cities()? {
            index.insert(c.geoname_id, EntityKind::City, c.translations);
        }
        Ok(index)
    }

    pub fn insert(&mut self, id: GeonameId, kind: EntityKind, translations: Translations) {
        self.entities.insert(id, IndexedEntity { kind, translations });
    }

    pub fn get(&self, id: GeonameId) -> Option<&IndexedEntity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: GeonameId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
