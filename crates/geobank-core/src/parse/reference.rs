// crates/geobank-core/src/parse/reference.rs
use crate::error::Result;
use crate::iso639;
use crate::model::{Currency, Flags, Language};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Raw country object from the restcountries-style reference document.
/// Only the fields the pipeline consumes are declared.
#[derive(Debug, Deserialize)]
struct RestCountryRaw {
    #[serde(default)]
    cca2: String,
    /// { "fra": "French", ... }
    #[serde(default)]
    languages: BTreeMap<String, String>,
    /// { "EUR": { "name": "Euro", "symbol": "€" }, ... }
    #[serde(default)]
    currencies: BTreeMap<String, CurrencyRaw>,
    #[serde(default)]
    flags: Option<FlagsRaw>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrencyRaw {
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct FlagsRaw {
    png: Option<String>,
    svg: Option<String>,
}

/// Languages, currencies and flags collected from the reference document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReferenceData {
    /// Sorted by code.
    pub languages: Vec<Language>,
    /// Sorted by code.
    pub currencies: Vec<Currency>,
    /// Keyed by iso2 code.
    pub flags: HashMap<String, Flags>,
}

/// Parses the reference document (a JSON array of country objects).
///
/// Languages and currencies are the union over all countries; when two
/// countries disagree on a name, the first one wins.
pub fn parse_reference(bytes: &[u8]) -> Result<ReferenceData> {
    let raw: Vec<RestCountryRaw> = serde_json::from_slice(bytes)?;

    let mut languages: BTreeMap<String, String> = BTreeMap::new();
    let mut currencies: BTreeMap<String, CurrencyRaw> = BTreeMap::new();
    let mut flags = HashMap::new();

    for country in raw {
        for (code, name) in country.languages {
            languages.entry(code).or_insert(name);
        }
        for (code, info) in country.currencies {
            currencies.entry(code).or_insert(info);
        }
        if let Some(f) = country.flags {
            if !country.cca2.is_empty() && (f.png.is_some() || f.svg.is_some()) {
                flags.insert(
                    country.cca2.to_uppercase(),
                    Flags {
                        png: f.png,
                        svg: f.svg,
                    },
                );
            }
        }
    }

    Ok(ReferenceData {
        languages: languages
            .into_iter()
            .map(|(code, name)| Language {
                code2: iso639::to_alpha2(&code).unwrap_or_default().to_string(),
                code,
                name,
            })
            .collect(),
        currencies: currencies
            .into_iter()
            .map(|(code, info)| Currency {
                code,
                name: info.name,
                symbol: info.symbol,
            })
            .collect(),
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"[
        {"cca2": "FR", "languages": {"fra": "French"},
         "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
         "flags": {"png": "https://flagcdn.com/w320/fr.png", "svg": "https://flagcdn.com/fr.svg", "alt": "x"}},
        {"cca2": "CH", "languages": {"fra": "Français", "deu": "German", "gsw": "Swiss German"},
         "currencies": {"CHF": {"name": "Swiss franc", "symbol": "Fr."}}},
        {"cca2": "AQ", "languages": {}, "currencies": {}}
    ]"#;

    #[test]
    fn collects_union_of_reference_data() {
        let data = parse_reference(DOC.as_bytes()).unwrap();

        let codes: Vec<_> = data.languages.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["deu", "fra", "gsw"]);
        let fra = &data.languages[1];
        assert_eq!(fra.name, "French");
        assert_eq!(fra.code2, "fr");
        assert_eq!(data.languages[2].code2, "");

        assert_eq!(data.currencies.len(), 2);
        assert_eq!(data.currencies[1].code, "EUR");
        assert_eq!(data.currencies[1].symbol, "€");

        assert_eq!(data.flags.len(), 1);
        assert_eq!(
            data.flags["FR"].svg.as_deref(),
            Some("https://flagcdn.com/fr.svg")
        );
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_reference(b"not json").is_err());
    }
}
