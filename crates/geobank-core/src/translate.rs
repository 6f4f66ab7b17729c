// crates/geobank-core/src/translate.rs

//! # Translation Merge Engine
//!
//! One pass over the alternate-names dump keeps, per `(geoname id, language)`,
//! the best candidate name:
//!
//! - no candidate yet: take the new one;
//! - stored candidate is preferred, new one is not: keep the stored one;
//! - otherwise: the new candidate overwrites.
//!
//! So among equally preferred candidates the last one in file order wins,
//! and a preferred name can only be displaced by another preferred name.
//! The winners are then folded onto the entities and persisted with one
//! bulk update per entity kind.

use crate::config::TranslationSchema;
use crate::error::Result;
use crate::model::{EntityKind, GeonameId};
use crate::parse::AlternateName;
use crate::resolve::EntityIndex;
use crate::store::{EntityStore, NameUpdate};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub preferred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Rejected,
}

/// Best candidate per `(geoname id, language)`.
#[derive(Debug, Default, Clone)]
pub struct TranslationMerger {
    best: HashMap<(GeonameId, String), Candidate>,
}

impl TranslationMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(
        &mut self,
        geoname_id: GeonameId,
        language: &str,
        name: &str,
        preferred: bool,
    ) -> MergeOutcome {
        let candidate = Candidate {
            name: name.to_string(),
            preferred,
        };
        match self.best.entry((geoname_id, language.to_string())) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                MergeOutcome::Inserted
            }
            Entry::Occupied(slot) if slot.get().preferred && !preferred => MergeOutcome::Rejected,
            Entry::Occupied(mut slot) => {
                slot.insert(candidate);
                MergeOutcome::Replaced
            }
        }
    }

    pub fn get(&self, geoname_id: GeonameId, language: &str) -> Option<&Candidate> {
        self.best.get(&(geoname_id, language.to_string()))
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Winning name per `(geoname id, language)`, ordered by key.
    pub fn into_winners(self) -> BTreeMap<(GeonameId, String), String> {
        self.best
            .into_iter()
            .map(|(key, candidate)| (key, candidate.name))
            .collect()
    }
}

// -----------------------------------------------------------------------------
// COLLECT
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub candidates: u64,
    pub unknown_entity: u64,
    pub other_language: u64,
    pub inserted: u64,
    pub replaced: u64,
    pub rejected: u64,
}

/// Feeds every candidate for a known entity and a target language into a
/// fresh merger. Stops at the first I/O error.
pub fn collect_translations<I>(
    rows: I,
    index: &EntityIndex,
    languages: &[String],
) -> Result<(TranslationMerger, MergeStats)>
where
    I: IntoIterator<Item = Result<AlternateName>>,
{
    let targets: HashSet<&str> = languages.iter().map(String::as_str).collect();
    let mut merger = TranslationMerger::new();
    let mut stats = MergeStats::default();

    for row in rows {
        let row = row?;
        stats.candidates += 1;

        if !index.contains(row.geoname_id) {
            stats.unknown_entity += 1;
            continue;
        }
        if !targets.contains(row.language.as_str()) {
            stats.other_language += 1;
            continue;
        }

        match merger.offer(row.geoname_id, &row.language, &row.name, row.preferred) {
            MergeOutcome::Inserted => stats.inserted += 1,
            MergeOutcome::Replaced => stats.replaced += 1,
            MergeOutcome::Rejected => stats.rejected += 1,
        }
    }

    debug!("merge stats: {stats:?}");
    Ok((merger, stats))
}

// -----------------------------------------------------------------------------
// APPLY & PERSIST
// -----------------------------------------------------------------------------

/// Name updates grouped by entity kind, ready for bulk persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationPlan {
    pub updates: BTreeMap<EntityKind, Vec<NameUpdate>>,
    /// Winners whose entity kind declares no field for their language.
    pub unsupported: u64,
}

impl TranslationPlan {
    pub fn modified(&self, kind: EntityKind) -> usize {
        self.updates.get(&kind).map_or(0, Vec::len)
    }
}

/// Folds the winning names onto the indexed entities.
///
/// Each modified entity carries its full name set (stored names plus the
/// new winners), so a bulk update never blanks an existing name.
pub fn apply_translations(
    merger: TranslationMerger,
    index: &EntityIndex,
    schema: &TranslationSchema,
) -> TranslationPlan {
    let mut modified: BTreeMap<GeonameId, NameUpdate> = BTreeMap::new();
    let mut kinds: HashMap<GeonameId, EntityKind> = HashMap::new();
    let mut unsupported = 0;

    for ((geoname_id, language), name) in merger.into_winners() {
        let Some(entity) = index.get(geoname_id) else {
            continue;
        };
        if !schema.supports(entity.kind, &language) {
            unsupported += 1;
            continue;
        }
        let update = modified.entry(geoname_id).or_insert_with(|| NameUpdate {
            geoname_id,
            names: entity.translations.clone(),
        });
        update.names.insert(language, name);
        kinds.insert(geoname_id, entity.kind);
    }

    let mut updates: BTreeMap<EntityKind, Vec<NameUpdate>> = BTreeMap::new();
    for (geoname_id, update) in modified {
        updates.entry(kinds[&geoname_id]).or_default().push(update);
    }

    TranslationPlan {
        updates,
        unsupported,
    }
}

/// Rows written per entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationSummary {
    pub countries: usize,
    pub regions: usize,
    pub cities: usize,
    pub unsupported: u64,
}

/// One bulk update per entity kind, touching only that kind's name fields
/// for the configured languages.
pub fn persist_translations<S: EntityStore + ?Sized>(
    store: &mut S,
    plan: &TranslationPlan,
    languages: &[String],
    schema: &TranslationSchema,
) -> Result<TranslationSummary> {
    let mut summary = TranslationSummary {
        unsupported: plan.unsupported,
        ..TranslationSummary::default()
    };

    for (kind, updates) in &plan.updates {
        if updates.is_empty() {
            continue;
        }
        let fields = schema.fields_for(*kind, languages);
        let written = store.bulk_update_names(*kind, updates, &fields)?;
        info!("Saved {written} {kind} translation(s) for {fields:?}");
        match kind {
            EntityKind::Country => summary.countries = written,
            EntityKind::Region => summary.regions = written,
            EntityKind::City => summary.cities = written,
        }
    }
    Ok(summary)
}
