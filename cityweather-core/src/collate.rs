//! Locale-aware ordering of display names.
//!
//! Names are compared in levels, the way a collator does for Latin text:
//! first on the letters alone (accents and case folded away), then on
//! accents, then on case (lowercase first). Raw text only breaks the final
//! tie so the ordering stays total.

use std::cmp::Ordering;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Precomputed comparison key for a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    letters: String,
    accents: String,
    case: Vec<bool>,
    raw: String,
}

pub fn sort_key(name: &str) -> SortKey {
    let decomposed: Vec<char> = name.nfd().collect();

    let letters = decomposed
        .iter()
        .filter(|c| !is_combining_mark(**c))
        .flat_map(|c| c.to_lowercase())
        .collect();

    let accents = decomposed.iter().flat_map(|c| c.to_lowercase()).collect();

    let case = decomposed
        .iter()
        .filter(|c| !is_combining_mark(**c))
        .map(|c| c.is_uppercase())
        .collect();

    SortKey { letters, accents, case, raw: name.to_owned() }
}

pub fn compare(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        out.sort_by(|a, b| compare(a, b));
        out
    }

    #[test]
    fn case_does_not_dominate_ordering() {
        // Byte order would put every uppercase name before "amsterdam".
        assert_eq!(sorted(&["Zurich", "amsterdam", "Berlin"]), vec!["amsterdam", "Berlin", "Zurich"]);
    }

    #[test]
    fn accented_letters_sort_with_their_base_letter() {
        assert_eq!(
            sorted(&["Zagreb", "Évora", "Fargo", "Essen"]),
            vec!["Essen", "Évora", "Fargo", "Zagreb"]
        );
        assert_eq!(sorted(&["Lyon", "Léon", "Lima"]), vec!["Léon", "Lima", "Lyon"]);
    }

    #[test]
    fn unaccented_before_accented_when_letters_tie() {
        assert_eq!(compare("Resume", "Résumé"), Ordering::Less);
        assert_eq!(compare("Résumé", "Resume"), Ordering::Greater);
    }

    #[test]
    fn lowercase_before_uppercase_when_otherwise_equal() {
        assert_eq!(compare("paris", "Paris"), Ordering::Less);
    }

    #[test]
    fn identical_names_compare_equal() {
        assert_eq!(compare("São Paulo", "São Paulo"), Ordering::Equal);
    }
}
