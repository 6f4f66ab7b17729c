// crates/geobank-core/src/parse/alternate.rs
use super::{parse_id, Parsed, RowFormat, SkipReason};
use crate::model::GeonameId;

/// One candidate name from the alternate-names dump.
///
/// Columns: alternate name id, geoname id, language, name, isPreferredName,
/// isShortName, isColloquial, isHistoric, from, to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateName {
    pub geoname_id: GeonameId,
    pub language: String,
    pub name: String,
    pub preferred: bool,
}

/// The alternate-names format. Entity and language filtering happen in
/// the merge engine, which owns those sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlternateNameFormat;

impl RowFormat for AlternateNameFormat {
    type Row = AlternateName;
    const MIN_COLUMNS: usize = 4;
    const COMMENTS: bool = false;

    fn parse(&self, c: &[&str]) -> Parsed<AlternateName> {
        let Some(geoname_id) = parse_id(c[1]) else {
            return Parsed::Skip(SkipReason::BadKey);
        };
        Parsed::Record(AlternateName {
            geoname_id,
            language: c[2].to_string(),
            name: c[3].to_string(),
            preferred: c.get(4).is_some_and(|flag| *flag == "1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tsv;

    #[test]
    fn parses_candidates() {
        let input = "1\t3017382\tfr\tFrance\t1\n2\t3017382\tde\tFrankreich\n3\tx\tfr\tBad\t1\n4\t3017382\tfr\n";
        let mut reader = parse_tsv(input.as_bytes(), AlternateNameFormat);
        let rows: Vec<_> = reader.by_ref().collect::<crate::Result<_>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].preferred);
        assert_eq!(rows[0].name, "France");
        assert!(!rows[1].preferred);
        assert_eq!(rows[1].language, "de");
        assert_eq!(reader.stats().bad_key, 1);
        assert_eq!(reader.stats().too_few_columns, 1);
    }

    #[test]
    fn hash_prefixed_names_are_not_comments() {
        let input = "#1\t42\ten\t#hashtag\t0\n";
        let rows: Vec<_> = parse_tsv(input.as_bytes(), AlternateNameFormat).collect();
        assert_eq!(rows.len(), 1);
    }
}
