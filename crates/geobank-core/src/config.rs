// crates/geobank-core/src/config.rs

//! # Configuration
//!
//! Everything the pipeline reads is passed in explicitly through
//! [`PopulateConfig`]; nothing is pulled from process-wide state.

use crate::error::{GeoError, Result};
use crate::model::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

// -----------------------------------------------------------------------------
// UPSTREAM SOURCES
// -----------------------------------------------------------------------------

pub const GEONAMES_DUMP_URL: &str = "https://download.geonames.org/export/dump";
pub const REST_COUNTRIES_URL: &str =
    "https://restcountries.com/v3.1/all?fields=cca2,languages,currencies,flags";

/// City thresholds the upstream publishes a dump for (`cities{N}.zip`).
pub const PUBLISHED_CITY_THRESHOLDS: [u32; 4] = [500, 1000, 5000, 15000];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sources {
    pub country_info_url: String,
    pub admin1_url: String,
    /// Directory URL holding the `cities{N}.zip` dumps.
    pub cities_base_url: String,
    pub alternate_names_url: String,
    /// Name of the tab-separated file inside the alternate-names archive.
    pub alternate_names_entry: String,
    pub rest_countries_url: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            country_info_url: format!("{GEONAMES_DUMP_URL}/countryInfo.txt"),
            admin1_url: format!("{GEONAMES_DUMP_URL}/admin1CodesASCII.txt"),
            cities_base_url: GEONAMES_DUMP_URL.to_string(),
            alternate_names_url: format!("{GEONAMES_DUMP_URL}/alternateNames.zip"),
            alternate_names_entry: "alternateNames.txt".to_string(),
            rest_countries_url: REST_COUNTRIES_URL.to_string(),
        }
    }
}

impl Sources {
    /// Picks the smallest published dump that still contains every city with
    /// `population >= min_population`.
    ///
    /// Returns `(url, inner entry name)`.
    pub fn cities_dump(&self, min_population: u32) -> (String, String) {
        let threshold = PUBLISHED_CITY_THRESHOLDS
            .iter()
            .rev()
            .copied()
            .find(|t| *t <= min_population)
            .unwrap_or(PUBLISHED_CITY_THRESHOLDS[0]);

        let base = self.cities_base_url.trim_end_matches('/');
        (
            format!("{base}/cities{threshold}.zip"),
            format!("cities{threshold}.txt"),
        )
    }
}

// -----------------------------------------------------------------------------
// RETRY POLICY
// -----------------------------------------------------------------------------

/// Bounds for one fetch: `timeout` applies to each attempt separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    #[serde(with = "secs")]
    pub timeout: Duration,
    pub max_attempts: u32,
    #[serde(with = "secs")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// -----------------------------------------------------------------------------
// TRANSLATION CAPABILITIES
// -----------------------------------------------------------------------------

/// Static declaration of which language codes each entity kind has a
/// name field for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSchema {
    fields: BTreeMap<EntityKind, BTreeSet<String>>,
}

impl TranslationSchema {
    /// Every kind exposes a name field for every language in `languages`.
    pub fn uniform<S: AsRef<str>>(languages: &[S]) -> Self {
        let set: BTreeSet<String> = languages.iter().map(|l| l.as_ref().to_string()).collect();
        let fields = EntityKind::ALL
            .iter()
            .map(|kind| (*kind, set.clone()))
            .collect();
        Self { fields }
    }

    pub fn with_kind<S: AsRef<str>>(mut self, kind: EntityKind, languages: &[S]) -> Self {
        self.fields.insert(
            kind,
            languages.iter().map(|l| l.as_ref().to_string()).collect(),
        );
        self
    }

    pub fn supports(&self, kind: EntityKind, lang: &str) -> bool {
        self.fields.get(&kind).is_some_and(|set| set.contains(lang))
    }

    /// The name fields of `kind` that a run over `languages` writes, in
    /// configured order.
    pub fn fields_for(&self, kind: EntityKind, languages: &[String]) -> Vec<String> {
        languages
            .iter()
            .filter(|lang| self.supports(kind, lang))
            .cloned()
            .collect()
    }
}

// -----------------------------------------------------------------------------
// TOP-LEVEL CONFIG
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateConfig {
    /// Target translation languages. Order does not affect the output.
    pub languages: Vec<String>,
    /// Cities below this population are not loaded.
    pub min_population: u32,
    pub sources: Sources,
    pub retry: RetryPolicy,
    /// Falls back to [`TranslationSchema::uniform`] over `languages`.
    pub translatable: Option<TranslationSchema>,
    /// Where large downloads are staged; the system temp dir when unset.
    pub download_dir: Option<PathBuf>,
}

impl Default for PopulateConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            min_population: 15000,
            sources: Sources::default(),
            retry: RetryPolicy::default(),
            translatable: None,
            download_dir: None,
        }
    }
}

impl PopulateConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GeoError::NotFound(format!("Config not found at {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(GeoError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        for lang in &self.languages {
            let ok = !lang.is_empty()
                && lang
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !ok {
                return Err(GeoError::InvalidConfig(format!(
                    "invalid language code {lang:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn translation_schema(&self) -> TranslationSchema {
        self.translatable
            .clone()
            .unwrap_or_else(|| TranslationSchema::uniform(&self.languages))
    }
}
