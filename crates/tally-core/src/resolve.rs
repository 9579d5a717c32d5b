//! # Catalog Resolver
//!
//! Matches a parsed name fragment against the product catalog.
//!
//! ## Two-Pass Matching
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Fragment: "ao so mi"        Catalog: [Áo Sơ Mi, Coca Cola, Sprite]    │
//! │                                                                         │
//! │  PASS 1: EXACT CONTAINMENT                                             │
//! │  ├── normalize fragment and every name/alias                           │
//! │  ├── fragment is a substring of a candidate? → return that product     │
//! │  └── first catalog-order hit wins (no ranking among exact hits)        │
//! │                                                                         │
//! │  PASS 2: FUZZY (only when pass 1 found nothing)                        │
//! │  ├── Levenshtein distance fragment ↔ every name/alias                  │
//! │  ├── containment bonus: |len(fragment) - len(candidate)| when one      │
//! │  │   string contains the other (cheaper than the raw edit distance)    │
//! │  ├── keep the single best (lowest) score across the whole catalog      │
//! │  └── best <= threshold (default 3)? → product, else no match           │
//! │                                                                         │
//! │  Ties on the minimal score go to the product encountered FIRST in      │
//! │  catalog iteration order. Callers pass the catalog in stable           │
//! │  insertion order, which makes the tie-break deterministic.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Complexity
//! O(products × aliases × fragment length × candidate length) per fragment.
//! Acceptable for the small local catalogs this targets (hundreds of items);
//! an n-gram index would be the upgrade path if that ever changes, and it
//! must not change observable matching results.

use crate::normalize::normalize;
use crate::types::Product;

/// Maximum edit distance accepted as a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: usize = 3;

/// Resolves a name fragment against the catalog with the default threshold.
///
/// Returns the matched product, or `None` when nothing comes close enough.
/// The catalog slice is a snapshot: resolution never mutates it, and callers
/// are expected to hold it stable for the duration of one analysis pass.
pub fn resolve_fragment<'a>(fragment: &str, catalog: &'a [Product]) -> Option<&'a Product> {
    resolve_fragment_with_threshold(fragment, catalog, DEFAULT_FUZZY_THRESHOLD)
}

/// Resolves a name fragment with an explicit fuzzy threshold.
pub fn resolve_fragment_with_threshold<'a>(
    fragment: &str,
    catalog: &'a [Product],
    threshold: usize,
) -> Option<&'a Product> {
    let fragment = normalize(fragment);
    if fragment.is_empty() {
        return None;
    }

    // Pass 1: exact containment. First catalog-order match wins.
    for product in catalog {
        if candidates(product).any(|c| normalize(&c).contains(&fragment)) {
            return Some(product);
        }
    }

    // Pass 2: fuzzy. Track the single best candidate across the catalog;
    // strict `<` keeps the first product on distance ties.
    let mut best: Option<(usize, &Product)> = None;
    for product in catalog {
        for candidate in candidates(product) {
            let candidate = normalize(&candidate);
            if candidate.is_empty() {
                continue;
            }

            let mut score = levenshtein(&fragment, &candidate);
            if candidate.contains(&fragment) || fragment.contains(&candidate) {
                let partial = fragment.chars().count().abs_diff(candidate.chars().count());
                score = score.min(partial);
            }

            if best.map_or(true, |(d, _)| score < d) {
                best = Some((score, product));
            }
        }
    }

    match best {
        Some((distance, product)) if distance <= threshold => Some(product),
        _ => None,
    }
}

/// Iterates a product's matchable strings: name first, then aliases in order.
fn candidates(product: &Product) -> impl Iterator<Item = String> + '_ {
    std::iter::once(product.name.clone()).chain(product.aliases.iter().cloned())
}

/// Classic two-row Levenshtein edit distance over chars.
///
/// Both inputs are already normalized, so the alphabet is lowercase ASCII
/// plus digits and spaces.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name: &str, aliases: &[&str]) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            price_cents: 10000,
            stock: 10,
            min_stock: 2,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("p1", "Áo Sơ Mi", &["ao somi"]),
            product("p2", "Coca Cola", &["coke", "cocacola"]),
            product("p3", "Sprite", &[]),
        ]
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("coca cola", "coca cola"), 0);
        assert_eq!(levenshtein("sprit", "sprite"), 1);
    }

    #[test]
    fn test_exact_match_ignores_case_and_diacritics() {
        let catalog = catalog();
        let hit = resolve_fragment("AO SO MI", &catalog).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn test_exact_match_on_alias() {
        let catalog = catalog();
        let hit = resolve_fragment("coke", &catalog).unwrap();
        assert_eq!(hit.id, "p2");
    }

    #[test]
    fn test_exact_substring_match() {
        // Fragment contained in a longer catalog name still matches exactly.
        let catalog = catalog();
        let hit = resolve_fragment("so mi", &catalog).unwrap();
        assert_eq!(hit.id, "p1");
    }

    #[test]
    fn test_fuzzy_match_typo() {
        let catalog = catalog();
        let hit = resolve_fragment("sprit", &catalog).unwrap();
        assert_eq!(hit.id, "p3");
        let hit = resolve_fragment("coca colaa", &catalog).unwrap();
        assert_eq!(hit.id, "p2");
    }

    #[test]
    fn test_no_match_beyond_threshold() {
        let catalog = vec![product("p1", "Coca Cola", &[])];
        assert!(resolve_fragment("xyz123", &catalog).is_none());
    }

    #[test]
    fn test_empty_fragment_no_match() {
        let catalog = catalog();
        assert!(resolve_fragment("", &catalog).is_none());
        assert!(resolve_fragment("  !! ", &catalog).is_none());
    }

    #[test]
    fn test_tie_breaks_to_first_in_catalog() {
        // Both candidates are distance 1 from the fragment; the product that
        // appears first in catalog order must win.
        let catalog = vec![
            product("first", "banh mo", &[]),
            product("second", "banh mu", &[]),
        ];
        let hit = resolve_fragment("banh mi", &catalog).unwrap();
        assert_eq!(hit.id, "first");
    }

    #[test]
    fn test_fragment_containing_candidate_matches() {
        // The exact pass only checks fragment-inside-candidate. A fragment
        // that CONTAINS the catalog name ("sprite ch" typed with trailing
        // noise) goes through the fuzzy pass and scores by length difference.
        let catalog = vec![product("p1", "Sprite", &[])];
        let hit = resolve_fragment("sprite ch", &catalog).unwrap();
        assert_eq!(hit.id, "p1");
        // Too much trailing noise pushes it past the threshold.
        assert!(resolve_fragment("sprite lanh lon", &catalog).is_none());
    }

    #[test]
    fn test_empty_catalog() {
        assert!(resolve_fragment("coca", &[]).is_none());
    }
}
