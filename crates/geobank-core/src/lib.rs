// crates/geobank-core/src/lib.rs

pub mod config;
pub mod error;
pub mod fetch;
pub mod iso639;
pub mod model;
pub mod parse;
pub mod populate; // Stage orchestration
pub mod resolve;
pub mod store;
pub mod text;
pub mod translate; // Merge rule for alternate names

#[cfg(test)]
mod fixtures;

// Re-exports
pub use crate::config::{PopulateConfig, RetryPolicy, Sources, TranslationSchema};
pub use crate::error::{FetchError, GeoError, Result};
#[cfg(feature = "http")]
pub use crate::fetch::HttpTransport;
pub use crate::fetch::{Fetcher, MirrorTransport, Transport};
pub use crate::model::{
    CallingCode, City, Country, Currency, DbStats, EntityKind, Flags, GeonameId, Language,
    Region, Translatable, Translations,
};
pub use crate::populate::{populate, PopulateReport, Populator, Stage, StageStatus, StageSummary};
pub use crate::store::{CompressionMode, EntityStore, MemoryStore};
