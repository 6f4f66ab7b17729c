// crates/geobank-core/tests/pipeline.rs
//
// End-to-end runs of the population pipeline against a local mirror of the
// upstream files.

use geobank_core::{
    populate, CompressionMode, EntityStore, GeoError, MemoryStore, MirrorTransport,
    PopulateConfig, RetryPolicy, Stage, StageStatus,
};
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const FRANCE: u64 = 3017382;
const GERMANY: u64 = 2921044;
const ALSACE: u64 = 3013736;
const BAVARIA: u64 = 2951839;
const STRASBOURG: u64 = 2973783;
const COLMAR: u64 = 3024297;
const MUNICH: u64 = 2867714;

const REFERENCE: &str = r#"[
    {"cca2": "FR", "languages": {"fra": "French"},
     "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
     "flags": {"png": "https://flagcdn.com/w320/fr.png", "svg": "https://flagcdn.com/fr.svg"}},
    {"cca2": "DE", "languages": {"deu": "German"},
     "currencies": {"EUR": {"name": "Euro", "symbol": "€"}}}
]"#;

const COUNTRY_INFO: &str = "\
#ISO\tISO3\tISO-Numeric\tfips\tCountry\tCapital\tArea(in sq km)\tPopulation\tContinent\ttld\tCurrencyCode\tCurrencyName\tPhone\tPostal Code Format\tPostal Code Regex\tLanguages\tgeonameid\tneighbours\tEquivalentFipsCode
DE\tDEU\t276\tGM\tGermany\tBerlin\t357021\t82927922\tEU\t.de\tEUR\tEuro\t49\t#####\t^(\\d{5})$\tde\t2921044\tCH,PL,NL,DK,BE,CZ,LU,FR,AT\t
FR\tFRA\t250\tFR\tFrance\tParis\t547030\t66987244\tEU\t.fr\tEUR\tEuro\t33\t#####\t^(\\d{5})$\tfr-FR,frp,br,co,ca,eu,oc\t3017382\tCH,DE,BE,LU,IT,AD,MC,ES\t
XK\t\t0\tKV\tBroken\t\t0\t0\tEU\t\t\t\t\t\t\t\tnot-a-number\t\t
";

const ADMIN1: &str = "\
FR.A8\tAlsace\tAlsace\t3013736
DE.02\tBavaria\tBavaria\t2951839
XX.01\tNowhere\tNowhere\t1
";

const ALTERNATE_NAMES: &str = "\
1\t3017382\tfr\tFrance\t1\t\t\t\t\t
2\t3017382\tfr\tRépublique française\t\t\t\t\t\t
3\t3013736\tfr\tAlsace\t\t\t\t\t\t
4\t2973783\tde\tStraßburg\t1\t\t\t\t\t
5\t2973783\tfr\tStrasbourg\t\t\t\t\t\t
6\t99999\tfr\tNowhere\t1\t\t\t\t\t
7\t2921044\tfr\tAllemagne\t1\t\t\t\t\t
8\t2921044\tit\tGermania\t1\t\t\t\t\t
9\t2921044\tde\tDeutschland\t1\t\t\t\t\t
10\t2921044\tde\tBRD\t\t\t\t\t\t
";

fn city_line(id: u64, name: &str, country: &str, region: &str, population: u64) -> String {
    let id = id.to_string();
    let population = population.to_string();
    [
        id.as_str(), name, name, "", "48.5", "7.7", "P", "PPL", country, "", region, "", "", "",
        population.as_str(), "", "", "Europe/Paris", "2024-01-01",
    ]
    .join("\t")
}

fn zip_with(entry: &str, content: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file(entry, options).unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Writes every upstream file the pipeline reads into a fresh directory.
fn mirror() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::write(root.join("all"), REFERENCE).unwrap();
    std::fs::write(root.join("countryInfo.txt"), COUNTRY_INFO).unwrap();
    std::fs::write(root.join("admin1CodesASCII.txt"), ADMIN1).unwrap();

    let cities = [
        city_line(STRASBOURG, "Strasbourg", "FR", "A8", 274_845),
        city_line(COLMAR, "Colmar", "FR", "99", 67_000),
        city_line(6_000_001, "Atlantis", "XX", "01", 50_000),
        city_line(6_000_002, "Hamlet", "FR", "A8", 800),
        city_line(MUNICH, "Munich", "DE", "02", 1_260_391),
    ]
    .join("\n");
    std::fs::write(
        root.join("cities15000.zip"),
        zip_with("cities15000.txt", cities.as_bytes()),
    )
    .unwrap();
    std::fs::write(
        root.join("alternateNames.zip"),
        zip_with("alternateNames.txt", ALTERNATE_NAMES.as_bytes()),
    )
    .unwrap();

    dir
}

fn config() -> PopulateConfig {
    PopulateConfig {
        languages: vec!["de".into(), "fr".into()],
        min_population: 15000,
        retry: RetryPolicy {
            timeout: Duration::from_secs(1),
            max_attempts: 1,
            backoff: Duration::ZERO,
        },
        ..PopulateConfig::default()
    }
}

fn run(root: &Path, store: &mut MemoryStore) -> geobank_core::PopulateReport {
    populate(store, MirrorTransport::new(root), config()).unwrap()
}

/// Runs with downloads staged in `downloads` so leftovers can be counted.
fn run_staged(
    root: &Path,
    downloads: &Path,
    cfg: PopulateConfig,
    store: &mut MemoryStore,
) -> geobank_core::PopulateReport {
    let cfg = PopulateConfig {
        download_dir: Some(downloads.to_path_buf()),
        ..cfg
    };
    populate(store, MirrorTransport::new(root), cfg).unwrap()
}

fn leftovers(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

/// Everything but the translation stage went through untouched.
fn assert_only_translations_failed(report: &geobank_core::PopulateReport, store: &MemoryStore) {
    assert!(
        matches!(report.status(Stage::Translations), Some(StageStatus::Failed(_))),
        "{report}"
    );
    assert_eq!(report.failed().count(), 1, "{report}");

    let stats = store.stats();
    assert_eq!(stats.countries, 2);
    assert_eq!(stats.regions, 2);
    assert_eq!(stats.cities, 3);
    assert_eq!(store.country(FRANCE).unwrap().neighbors, vec![GERMANY]);
    assert_eq!(store.city(STRASBOURG).unwrap().region, Some(ALSACE));
    assert!(store.country(GERMANY).unwrap().translations.is_empty());
    assert!(store.city(STRASBOURG).unwrap().translations.is_empty());
}

#[test]
fn full_run_links_every_entity() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    let report = run(dir.path(), &mut store);

    assert!(report.is_success(), "{report}");
    assert_eq!(report.summary(Stage::Countries).unwrap().written, 2);
    assert_eq!(report.summary(Stage::Countries).unwrap().skipped, 1);

    let france = store.country(FRANCE).unwrap();
    assert_eq!(france.code3, "FRA");
    assert_eq!(france.currency.as_deref(), Some("EUR"));
    assert_eq!(france.languages, vec!["fra".to_string()]);
    assert_eq!(france.neighbors, vec![GERMANY]);
    assert_eq!(
        france.flag_svg.as_deref(),
        Some("https://flagcdn.com/fr.svg")
    );
    let codes: Vec<String> = store
        .calling_codes(FRANCE)
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["33".to_string()]);

    // no flag data for Germany: left empty
    let germany = store.country(GERMANY).unwrap();
    assert_eq!(germany.flag_png, None);
    assert_eq!(germany.neighbors, vec![FRANCE]);

    assert_eq!(store.region(ALSACE).unwrap().country, FRANCE);
    assert_eq!(store.region(BAVARIA).unwrap().country, GERMANY);
    assert_eq!(store.stats().regions, 2);

    let strasbourg = store.city(STRASBOURG).unwrap();
    assert_eq!(strasbourg.country, FRANCE);
    assert_eq!(strasbourg.region, Some(ALSACE));
    assert_eq!(store.city(MUNICH).unwrap().region, Some(BAVARIA));
}

#[test]
fn cities_with_unknown_parents() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    run(dir.path(), &mut store);

    // unknown region: kept without one
    let colmar = store.city(COLMAR).unwrap();
    assert_eq!(colmar.country, FRANCE);
    assert_eq!(colmar.region, None);

    // unknown country: omitted; below threshold: never parsed
    assert!(store.city(6_000_001).is_none());
    assert!(store.city(6_000_002).is_none());
    assert_eq!(store.stats().cities, 3);
}

#[test]
fn translations_follow_the_merge_rule() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    run(dir.path(), &mut store);

    let france = store.country(FRANCE).unwrap();
    assert_eq!(france.translations.get("fr").map(String::as_str), Some("France"));
    assert_eq!(france.translations.get("de"), None);

    let germany = store.country(GERMANY).unwrap();
    assert_eq!(germany.translations["fr"], "Allemagne");
    assert_eq!(germany.translations["de"], "Deutschland");
    assert!(!germany.translations.contains_key("it"));

    assert_eq!(store.region(ALSACE).unwrap().translations["fr"], "Alsace");

    let strasbourg = store.city(STRASBOURG).unwrap();
    assert_eq!(strasbourg.translations["de"], "Straßburg");
    assert_eq!(strasbourg.translations["fr"], "Strasbourg");
}

#[test]
fn translation_download_is_removed_after_a_run() {
    let dir = mirror();
    let downloads = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new();
    let report = run_staged(dir.path(), downloads.path(), config(), &mut store);

    assert!(report.is_success(), "{report}");
    assert_eq!(store.country(GERMANY).unwrap().translations["de"], "Deutschland");
    assert_eq!(leftovers(downloads.path()), Vec::<std::path::PathBuf>::new());
}

#[test]
fn corrupt_alternate_names_archive_fails_only_translations() {
    let dir = mirror();
    std::fs::write(
        dir.path().join("alternateNames.zip"),
        b"PK\x03\x04 this is not a zip archive",
    )
    .unwrap();

    let downloads = tempfile::tempdir().unwrap();
    let mut store = MemoryStore::new();
    let report = run_staged(dir.path(), downloads.path(), config(), &mut store);

    assert_only_translations_failed(&report, &store);
    assert_eq!(leftovers(downloads.path()), Vec::<std::path::PathBuf>::new());
}

#[test]
fn missing_alternate_names_entry_fails_only_translations() {
    let dir = mirror();
    let downloads = tempfile::tempdir().unwrap();
    let mut cfg = config();
    cfg.sources.alternate_names_entry = "alternateNamesV2.txt".into();

    let mut store = MemoryStore::new();
    let report = run_staged(dir.path(), downloads.path(), cfg, &mut store);

    assert_only_translations_failed(&report, &store);
    match report.status(Stage::Translations) {
        Some(StageStatus::Failed(message)) => {
            assert!(message.contains("alternateNamesV2.txt"), "{message}")
        }
        other => panic!("expected a failed translation stage, got {other:?}"),
    }
    assert_eq!(leftovers(downloads.path()), Vec::<std::path::PathBuf>::new());
}

#[test]
fn second_run_changes_nothing() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    run(dir.path(), &mut store);
    let first = store.clone();

    let report = run(dir.path(), &mut store);
    assert!(report.is_success(), "{report}");
    assert_eq!(store, first);
}

#[test]
fn failed_reference_stages_do_not_block_the_rest() {
    let dir = mirror();
    std::fs::remove_file(dir.path().join("all")).unwrap();

    let mut store = MemoryStore::new();
    let report = run(dir.path(), &mut store);

    for stage in [Stage::Languages, Stage::Currencies, Stage::Flags] {
        assert!(
            matches!(report.status(stage), Some(StageStatus::Failed(_))),
            "{stage} should have failed"
        );
    }
    assert_eq!(report.failed().count(), 3);

    // countries still load, just without currency and languages
    let france = store.country(FRANCE).unwrap();
    assert_eq!(france.currency, None);
    assert!(france.languages.is_empty());
    assert_eq!(france.neighbors, vec![GERMANY]);
    assert_eq!(france.translations["fr"], "France");
    assert_eq!(store.stats().cities, 3);
}

#[test]
fn missing_countries_skip_the_neighbor_pass() {
    let dir = mirror();
    std::fs::remove_file(dir.path().join("countryInfo.txt")).unwrap();

    let mut store = MemoryStore::new();
    let report = run(dir.path(), &mut store);

    assert!(matches!(
        report.status(Stage::Countries),
        Some(StageStatus::Failed(_))
    ));
    assert_eq!(report.status(Stage::Neighbors), Some(&StageStatus::Skipped));

    let regions = report.summary(Stage::Regions).unwrap();
    assert_eq!(regions.written, 0);
    assert_eq!(regions.skipped, 3);
    assert_eq!(store.stats().countries, 0);
    assert_eq!(store.stats().cities, 0);
}

#[test]
fn invalid_config_is_rejected_before_any_stage() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    let mut cfg = config();
    cfg.retry.max_attempts = 0;

    let err = populate(&mut store, MirrorTransport::new(dir.path()), cfg).unwrap_err();
    assert!(matches!(err, GeoError::InvalidConfig(_)));
    assert_eq!(store, MemoryStore::new());
}

#[test]
fn populated_store_survives_a_snapshot() {
    let dir = mirror();
    let mut store = MemoryStore::new();
    run(dir.path(), &mut store);

    let path = dir.path().join("geobank.bin");
    store
        .save_snapshot(&path, CompressionMode::default())
        .unwrap();
    let loaded = MemoryStore::load_snapshot(&path, CompressionMode::default()).unwrap();
    assert_eq!(loaded, store);
}
