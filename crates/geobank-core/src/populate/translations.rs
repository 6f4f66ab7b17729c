// crates/geobank-core/src/populate/translations.rs
use crate::config::{Sources, TranslationSchema};
use crate::error::Result;
use crate::fetch::{Fetcher, Transport};
use crate::parse::{AlternateNameFormat, ArchiveSource};
use crate::resolve::EntityIndex;
use crate::store::EntityStore;
use crate::translate::{
    apply_translations, collect_translations, persist_translations, TranslationSummary,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Deletes a downloaded file when dropped, whatever happened in between.
struct TempDownload {
    path: PathBuf,
}

impl TempDownload {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDownload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {e}", self.path.display()),
        }
    }
}

/// Downloads the alternate-names archive, merges the candidates for the
/// configured languages and writes the winners back to the store.
///
/// The archive is large, so it goes to a temporary file and its entry is
/// streamed. The file is gone when this returns, on success or failure.
pub fn translate_entities<S, T>(
    store: &mut S,
    fetcher: &Fetcher<T>,
    sources: &Sources,
    languages: &[String],
    schema: &TranslationSchema,
) -> Result<TranslationSummary>
where
    S: EntityStore + ?Sized,
    T: Transport,
{
    info!("Translating entities to {languages:?}...");
    if languages.is_empty() {
        info!("No target languages configured, nothing to translate");
        return Ok(TranslationSummary::default());
    }

    let index = EntityIndex::build(&*store)?;
    info!("Loaded {} entities for translation", index.len());

    let (merger, stats) = {
        let download = TempDownload {
            path: fetcher.fetch_to_temp_file(&sources.alternate_names_url)?,
        };
        let mut archive = ArchiveSource::open_path(download.path())?;
        let rows = archive.records(&sources.alternate_names_entry, AlternateNameFormat)?;
        collect_translations(rows, &index, languages)?
    };
    info!(
        "Kept {} translation(s) from {} candidate(s)",
        merger.len(),
        stats.candidates
    );

    let plan = apply_translations(merger, &index, schema);
    if plan.unsupported > 0 {
        warn!(
            "{} translation(s) skipped: no name field for their language",
            plan.unsupported
        );
    }
    persist_translations(store, &plan, languages, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_download_removes_its_file() {
        let path = tempfile::NamedTempFile::new()
            .unwrap()
            .into_temp_path()
            .keep()
            .unwrap();
        assert!(path.exists());
        drop(TempDownload { path: path.clone() });
        assert!(!path.exists());

        // already gone: nothing to report
        drop(TempDownload { path });
    }
}
