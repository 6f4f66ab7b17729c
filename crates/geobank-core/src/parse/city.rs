// crates/geobank-core/src/parse/city.rs
use super::{parse_id, parse_opt, Parsed, RowFormat, SkipReason};
use crate::model::GeonameId;

/// One line of a `cities{N}.txt` dump.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRow {
    pub geoname_id: GeonameId,
    pub name: String,
    pub name_ascii: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country_code: String,
    pub region_code: String,
    pub population: Option<u64>,
    pub timezone: String,
}

/// City dump format with the population threshold applied while parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityFormat {
    pub min_population: u64,
}

impl CityFormat {
    pub fn new(min_population: u32) -> Self {
        Self {
            min_population: u64::from(min_population),
        }
    }
}

impl RowFormat for CityFormat {
    type Row = CityRow;
    const MIN_COLUMNS: usize = 19;

    fn parse(&self, c: &[&str]) -> Parsed<CityRow> {
        let Some(geoname_id) = parse_id(c[0]) else {
            return Parsed::Skip(SkipReason::BadKey);
        };

        let population: Option<u64> = parse_opt(c[14]);
        if population.unwrap_or(0) < self.min_population {
            return Parsed::Skip(SkipReason::Filtered);
        }

        // Both coordinates or neither.
        let (latitude, longitude) = match (parse_opt::<f64>(c[4]), parse_opt::<f64>(c[5])) {
            (Some(lat), Some(lng)) => (Some(lat), Some(lng)),
            _ => (None, None),
        };

        Parsed::Record(CityRow {
            geoname_id,
            name: c[1].trim().to_string(),
            name_ascii: c[2].trim().to_string(),
            latitude,
            longitude,
            country_code: c[8].trim().to_string(),
            region_code: c[10].trim().to_string(),
            population,
            timezone: c[17].trim().to_string(),
        })
    }
}
