// crates/geobank-core/src/text.rs

/// Best-effort ASCII transliteration (`"Åland"` -> `"Aland"`).
///
/// Used for the country dump, which ships no ascii-name column.
pub fn to_ascii(s: &str) -> String {
    deunicode::deunicode(s)
}

/// Convert a string into a folded key suitable for lookups and comparison.
///
/// Transliterates to ASCII and lowercases, so `"Łódź"` and `"lodz"` fold to
/// the same key.
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}
