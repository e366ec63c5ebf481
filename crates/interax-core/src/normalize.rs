//! Canonicalization, pair-key derivation, and pair/triple enumeration (C1).

use crate::model::{NormalizedItem, PairKey};

/// Errors raised while normalizing a request's item list.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The item count was zero or exceeded the policy-bounded maximum.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Canonicalizes a single item string: trim, fold to lowercase, collapse
/// internal whitespace runs to a single space, and normalize whitespace
/// around `/` so combination products share a canonical spelling.
///
/// Idempotent: `canonicalize(canonicalize(s)) == canonicalize(s)`.
#[must_use]
pub fn canonicalize(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    normalize_slash_whitespace(&collapsed)
}

/// Strips any whitespace immediately adjacent to a `/` so `"a / b"`,
/// `"a/ b"`, and `"a /b"` all canonicalize to `"a/b"`.
fn normalize_slash_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            if chars.peek() == Some(&'/') {
                continue;
            }
            out.push(c);
        } else if c == '/' {
            if out.ends_with(' ') {
                out.pop();
            }
            out.push(c);
            while chars.peek() == Some(&' ') {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Derives the order-insensitive pair key for two canonical values.
#[must_use]
pub fn pair_key(canonical_a: &str, canonical_b: &str) -> PairKey {
    PairKey::new(canonical_a, canonical_b)
}

/// Normalizes a request's original item strings, enforcing the
/// `1..=max_items` policy bound.
///
/// # Errors
///
/// Returns [`NormalizeError::InvalidInput`] when `originals` is empty or
/// exceeds `max_items`.
pub fn normalize_items(originals: &[String], max_items: usize) -> Result<Vec<NormalizedItem>, NormalizeError> {
    if originals.is_empty() {
        return Err(NormalizeError::InvalidInput("at least one item is required".to_string()));
    }
    if originals.len() > max_items {
        return Err(NormalizeError::InvalidInput(format!(
            "at most {max_items} items are allowed, got {}",
            originals.len()
        )));
    }
    Ok(originals
        .iter()
        .map(|original| NormalizedItem {
            normalized: canonicalize(original),
            original: original.clone(),
        })
        .collect())
}

/// Enumerates every unordered pair of distinct indices into `items`, in
/// ascending `(i, j)` order with `i < j`.
#[must_use]
pub fn enumerate_pairs(items: &[NormalizedItem]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Enumerates every unordered triple of distinct indices into `items`, in
/// ascending `(i, j, k)` order with `i < j < k`. No two triples share the
/// same underlying set.
#[must_use]
pub fn enumerate_triples(items: &[NormalizedItem]) -> Vec<(usize, usize, usize)> {
    let mut triples = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            for k in (j + 1)..items.len() {
                triples.push((i, j, k));
            }
        }
    }
    triples
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test assertions")]

    use super::*;

    #[test]
    fn canonicalize_trims_and_lowercases() {
        assert_eq!(canonicalize("  Warfarin  "), "warfarin");
    }

    #[test]
    fn canonicalize_collapses_internal_whitespace() {
        assert_eq!(canonicalize("St.   John's   Wort"), "st. john's wort");
    }

    #[test]
    fn canonicalize_normalizes_slash_whitespace() {
        assert_eq!(canonicalize("amoxicillin / clavulanate"), "amoxicillin/clavulanate");
        assert_eq!(canonicalize("amoxicillin/ clavulanate"), "amoxicillin/clavulanate");
        assert_eq!(canonicalize("amoxicillin /clavulanate"), "amoxicillin/clavulanate");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize("  Amoxicillin / Clavulanate ");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn empty_input_is_invalid() {
        assert_eq!(
            normalize_items(&[], 10),
            Err(NormalizeError::InvalidInput("at least one item is required".to_string()))
        );
    }

    #[test]
    fn over_bound_input_is_invalid() {
        let items = vec!["a".to_string(); 11];
        assert!(normalize_items(&items, 10).is_err());
    }

    #[test]
    fn ten_items_yield_45_pairs_and_120_triples() {
        let originals: Vec<String> = (0..10).map(|i| format!("item-{i}")).collect();
        let items = normalize_items(&originals, 10).expect("within bound");
        assert_eq!(enumerate_pairs(&items).len(), 45);
        assert_eq!(enumerate_triples(&items).len(), 120);
    }

    #[test]
    fn pair_key_is_symmetric_over_canonical_values() {
        let a = canonicalize("Warfarin");
        let b = canonicalize("Ibuprofen");
        assert_eq!(pair_key(&a, &b), pair_key(&b, &a));
    }
}
