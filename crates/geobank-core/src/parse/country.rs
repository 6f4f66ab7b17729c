// crates/geobank-core/src/parse/country.rs
use super::{parse_id, parse_opt, Parsed, RowFormat, SkipReason};
use crate::model::GeonameId;

/// One line of the country dump (`countryInfo.txt`).
///
/// Columns: iso2, iso3, iso-numeric, fips, name, capital, area, population,
/// continent, tld, currency code, currency name, phone, postal format,
/// postal regex, languages, geoname id, neighbours, equivalent fips.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRow {
    pub geoname_id: GeonameId,
    pub code2: String,
    pub code3: String,
    pub fips: String,
    pub name: String,
    pub capital: String,
    pub population: Option<u64>,
    pub continent: String,
    pub tld: String,
    pub currency_code: String,
    pub calling_codes: Vec<String>,
    pub postal_code_format: String,
    pub postal_code_regex: String,
    /// Raw language tags, e.g. `"en-CA,fr-CA,iu"`.
    pub languages: String,
    /// Raw neighbour iso2 codes, e.g. `"DE,BE"`. Resolved in a later pass.
    pub neighbors: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountryFormat;

impl RowFormat for CountryFormat {
    type Row = CountryRow;
    const MIN_COLUMNS: usize = 17;

    fn parse(&self, c: &[&str]) -> Parsed<CountryRow> {
        let Some(geoname_id) = parse_id(c[16]) else {
            return Parsed::Skip(SkipReason::BadKey);
        };
        let code2 = c[0].trim();
        let code3 = c[1].trim();
        if code2.is_empty() || code3.is_empty() {
            return Parsed::Skip(SkipReason::BadKey);
        }

        Parsed::Record(CountryRow {
            geoname_id,
            code2: code2.to_string(),
            code3: code3.to_string(),
            fips: c[3].trim().to_string(),
            name: c[4].trim().to_string(),
            capital: c[5].trim().to_string(),
            population: parse_opt(c[7]),
            continent: c[8].trim().to_string(),
            tld: c[9].trim().to_string(),
            currency_code: c[10].trim().to_string(),
            calling_codes: parse_calling_codes(c[12]),
            postal_code_format: c[13].trim().to_string(),
            postal_code_regex: c[14].trim().to_string(),
            languages: c[15].trim().to_string(),
            neighbors: c.get(17).map(|s| s.trim().to_string()).unwrap_or_default(),
        })
    }
}

/// Splits the dump's phone column (`"+1-809 and 1-829"`, `"33"`) into
/// individual codes, without `+`, deduplicated in order.
pub fn parse_calling_codes(phone: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in phone.split(" and ").flat_map(|p| p.split(',')) {
        let code = part.trim().trim_start_matches('+').trim();
        if !code.is_empty() && !out.iter().any(|c| c == code) {
            out.push(code.to_string());
        }
    }
    out
}

/// Reduces a languages string (`"en-CA,fr-CA,iu"`) to lowercase base tags
/// (`["en", "fr", "iu"]`), deduplicated in order.
pub fn parse_language_tags(languages: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in languages.split(',') {
        let base = tag.split('-').next().unwrap_or("").trim().to_lowercase();
        if !base.is_empty() && !out.contains(&base) {
            out.push(base);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tsv;

    const FR_LINE: &str = "FR\tFRA\t250\tFR\tFrance\tParis\t547030\t66987244\tEU\t.fr\tEUR\tEuro\t33\t#####\t^(\\d{5})$\tfr-FR,frp,br,co,ca,eu,oc\t3017382\tCH,DE,BE,LU,IT,AD,MC,ES\t";

    #[test]
    fn parses_country_line() {
        let input = format!("#ISO\tISO3\n{FR_LINE}\n");
        let rows: Vec<_> = parse_tsv(input.as_bytes(), CountryFormat)
            .collect::<crate::Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);

        let fr = &rows[0];
        assert_eq!(fr.geoname_id, 3017382);
        assert_eq!(fr.code2, "FR");
        assert_eq!(fr.code3, "FRA");
        assert_eq!(fr.population, Some(66987244));
        assert_eq!(fr.currency_code, "EUR");
        assert_eq!(fr.calling_codes, vec!["33"]);
        assert_eq!(fr.postal_code_regex, "^(\\d{5})$");
        assert_eq!(fr.neighbors, "CH,DE,BE,LU,IT,AD,MC,ES");
    }

    #[test]
    fn population_failure_keeps_record_but_bad_id_skips_it() {
        let bad_pop = FR_LINE.replace("66987244", "n/a");
        let bad_id = FR_LINE.replace("3017382", "abc");
        let input = format!("{bad_pop}\n{bad_id}\n");

        let mut reader = parse_tsv(input.as_bytes(), CountryFormat);
        let rows: Vec<_> = reader.by_ref().collect::<crate::Result<_>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].population, None);
        assert_eq!(reader.stats().bad_key, 1);
    }

    #[test]
    fn sixteen_columns_are_too_few() {
        let short: Vec<&str> = FR_LINE.split('\t').take(16).collect();
        let input = short.join("\t");
        assert_eq!(parse_tsv(input.as_bytes(), CountryFormat).count(), 0);
    }

    #[test]
    fn seventeen_columns_have_no_neighbours() {
        let cols: Vec<&str> = FR_LINE.split('\t').take(17).collect();
        let input = cols.join("\t");
        let row = parse_tsv(input.as_bytes(), CountryFormat)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.neighbors, "");
    }

    #[test]
    fn splits_calling_codes() {
        assert_eq!(parse_calling_codes("+1-809 and 1-829"), vec!["1-809", "1-829"]);
        assert_eq!(parse_calling_codes("7,7"), vec!["7"]);
        assert!(parse_calling_codes("").is_empty());
    }

    #[test]
    fn reduces_language_tags() {
        assert_eq!(parse_language_tags("en,fr-CA"), vec!["en", "fr"]);
        assert_eq!(parse_language_tags("EN-us, en ,,iu"), vec!["en", "iu"]);
    }
}
