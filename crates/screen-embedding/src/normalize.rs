//! Matching keys for entity names
//!
//! A key is the NFKC-folded, lowercased name with every run of
//! non-alphanumeric characters collapsed to a single space. Exact matching
//! compares keys and the hashing embedder hashes their tokens.

use unicode_normalization::UnicodeNormalization;

const LEGAL_SUFFIXES: &[&str] = &[
    // Common-law forms
    "inc", "incorporated", "corp", "corporation", "co", "company", "llc", "llp", "lp", "ltd", "limited", "plc",
    // Civil-law forms
    "sa", "sas", "sarl", "srl", "ag", "gmbh", "kg", "se", "nv", "bv",
    // Asia-Pacific forms
    "pty", "pte", "bhd", "sdn",
];

/// Matching key for `s`.
///
/// ```
/// use screen_embedding::normalize_entity_text;
///
/// assert_eq!(normalize_entity_text("Oceanic Holdings, LLC"), "oceanic holdings llc");
/// ```
pub fn normalize_entity_text(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.nfkc() {
        if c.is_alphanumeric() {
            if pending_space && !key.is_empty() {
                key.push(' ');
            }
            pending_space = false;
            key.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    key
}

/// True for a lowercased legal-form token such as `llc` or `gmbh`
pub fn is_legal_suffix(token: &str) -> bool {
    LEGAL_SUFFIXES.contains(&token)
}

/// Drop trailing legal-form tokens from a key.
///
/// Only the tail is trimmed, so `"sa holdings"` is left alone. A key made
/// only of legal forms is returned unchanged.
///
/// ```
/// use screen_embedding::{normalize_entity_text, strip_legal_suffixes};
///
/// let key = normalize_entity_text("Quantum Holdings Pty. Ltd.");
/// assert_eq!(strip_legal_suffixes(&key), "quantum holdings");
/// ```
pub fn strip_legal_suffixes(key: &str) -> String {
    let tokens: Vec<&str> = key.split(' ').collect();
    let keep = tokens
        .iter()
        .rposition(|t| !is_legal_suffix(t))
        .map_or(tokens.len(), |last| last + 1);
    tokens[..keep].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_fold_case_width_and_punctuation() {
        assert_eq!(normalize_entity_text("Ｐａｎａｍａ"), "panama");
        assert_eq!(normalize_entity_text("  Alas   Chiricanas "), "alas chiricanas");
        assert_eq!(normalize_entity_text("AT&T Inc."), "at t inc");
        assert_eq!(normalize_entity_text("$5,000,000"), "5 000 000");
        assert_eq!(normalize_entity_text("Société Générale"), "société générale");
    }

    #[test]
    fn test_symbol_only_text_has_empty_key() {
        assert_eq!(normalize_entity_text("---"), "");
        assert_eq!(normalize_entity_text(""), "");
    }

    #[test]
    fn test_strip_trailing_forms_only() {
        assert_eq!(strip_legal_suffixes("oceanic holdings llc"), "oceanic holdings");
        assert_eq!(strip_legal_suffixes("sa holdings"), "sa holdings");
        assert_eq!(strip_legal_suffixes("acme co ltd"), "acme");
        assert_eq!(strip_legal_suffixes("panama"), "panama");
    }

    #[test]
    fn test_strip_keeps_all_suffix_keys() {
        assert_eq!(strip_legal_suffixes("co ltd"), "co ltd");
        assert_eq!(strip_legal_suffixes(""), "");
    }
}
