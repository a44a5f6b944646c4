use unicode_normalization::UnicodeNormalization;

/// Known alternate spellings, keyed by canonical form.
const ALIASES: &[(&str, &str)] = &[("oezil", "ozil")];

/// Combining Diacritical Marks block (U+0300..=U+036F).
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Reduce free text to a matchable key: accents stripped, lower-case ASCII
/// letters, single spaces and hyphens only.
///
/// Total and idempotent: `canonicalize(&canonicalize(x)) == canonicalize(x)`.
pub fn canonicalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|&c| !is_combining_diacritic(c))
        .flat_map(char::to_lowercase)
        .filter(|&c| c.is_ascii_lowercase() || c == '-' || c.is_whitespace())
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a canonical key to its preferred spelling, or return it unchanged.
pub fn resolve_alias(key: &str) -> &str {
    ALIASES
        .iter()
        .find(|&&(from, _)| from == key)
        .map_or(key, |&(_, to)| to)
}

/// Key used for every roster comparison.
pub fn match_key(text: &str) -> String {
    resolve_alias(&canonicalize(text)).to_string()
}
