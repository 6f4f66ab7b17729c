// crates/geobank-core/src/parse/region.rs
use super::{parse_id, Parsed, RowFormat, SkipReason};
use crate::model::GeonameId;

/// One line of the admin-1 dump: `"CC.RR"`, name, ascii name, geoname id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRow {
    pub geoname_id: GeonameId,
    pub country_code: String,
    pub region_code: String,
    pub name: String,
    pub name_ascii: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionFormat;

impl RowFormat for RegionFormat {
    type Row = RegionRow;
    const MIN_COLUMNS: usize = 4;

    fn parse(&self, c: &[&str]) -> Parsed<RegionRow> {
        let Some((country_code, region_code)) = c[0].trim().split_once('.') else {
            return Parsed::Skip(SkipReason::BadKey);
        };
        if country_code.is_empty() || region_code.is_empty() {
            return Parsed::Skip(SkipReason::BadKey);
        }
        let Some(geoname_id) = parse_id(c[3]) else {
            return Parsed::Skip(SkipReason::BadKey);
        };

        Parsed::Record(RegionRow {
            geoname_id,
            country_code: country_code.to_string(),
            region_code: region_code.to_string(),
            name: c[1].trim().to_string(),
            name_ascii: c[2].trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tsv;

    #[test]
    fn parses_admin1_lines() {
        let input = "FR.A8\tAlsace\tAlsace\t3013736\nFRA8\tNo dot\tNo dot\t1\nFR.11\tÎle-de-France\tIle-de-France\tx\nDE.02\tBavaria\n";
        let mut reader = parse_tsv(input.as_bytes(), RegionFormat);
        let rows: Vec<_> = reader.by_ref().collect::<crate::Result<_>>().unwrap();

        assert_eq!(
            rows,
            vec![RegionRow {
                geoname_id: 3013736,
                country_code: "FR".into(),
                region_code: "A8".into(),
                name: "Alsace".into(),
                name_ascii: "Alsace".into(),
            }]
        );
        assert_eq!(reader.stats().bad_key, 2);
        assert_eq!(reader.stats().too_few_columns, 1);
    }
}
