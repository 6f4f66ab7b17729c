// crates/geobank-core/src/fixtures.rs

//! Builders shared by the unit tests.

use crate::model::{City, Country, GeonameId, Region, Translations};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

pub(crate) fn country(id: GeonameId, code2: &str, code3: &str, name: &str) -> Country {
    Country {
        geoname_id: id,
        code2: code2.into(),
        code3: code3.into(),
        name: name.into(),
        name_ascii: name.into(),
        fips: String::new(),
        continent: "EU".into(),
        capital: String::new(),
        population: None,
        tld: String::new(),
        postal_code_format: String::new(),
        postal_code_regex: String::new(),
        currency: None,
        flag_png: None,
        flag_svg: None,
        active: true,
        languages: Vec::new(),
        neighbors: Vec::new(),
        translations: Translations::new(),
    }
}

pub(crate) fn region(id: GeonameId, country: GeonameId, code: &str, name: &str) -> Region {
    Region {
        geoname_id: id,
        country,
        code: code.into(),
        name: name.into(),
        name_ascii: name.into(),
        translations: Translations::new(),
    }
}

pub(crate) fn city(
    id: GeonameId,
    country: GeonameId,
    region: Option<GeonameId>,
    name: &str,
) -> City {
    City {
        geoname_id: id,
        country,
        region,
        name: name.into(),
        name_ascii: name.into(),
        latitude: None,
        longitude: None,
        population: Some(100_000),
        timezone: "Europe/Paris".into(),
        translations: Translations::new(),
    }
}

/// Builds an in-memory zip with a single stored entry.
pub(crate) fn zip_with(entry: &str, content: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file(entry, options).unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}
