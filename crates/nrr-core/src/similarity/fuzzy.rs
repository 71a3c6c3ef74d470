//! Fuzzy token-set matching.

use std::collections::BTreeSet;

use super::lcs::lcs_chars;

/// Token-set similarity of two normalized strings in `[0, 100]`.
///
/// Tokens are compared as sets, so order and repetition do not matter.
/// The shared tokens are compared against each side's shared-plus-remaining
/// tokens and the best of the three pairwise ratios wins. Identical token
/// sets score 100, sets without a common token score 0.
///
/// # Examples
/// ```
/// use nrr_core::similarity::fuzzy_score;
///
/// assert_eq!(fuzzy_score("pie apple", "apple pie apple"), 100);
/// assert_eq!(fuzzy_score("apple pie", "banana bread"), 0);
/// ```
#[must_use]
pub fn fuzzy_score(query: &str, text: &str) -> u8 {
    let left: BTreeSet<&str> = query.split_whitespace().collect();
    let right: BTreeSet<&str> = text.split_whitespace().collect();

    let shared = join(left.intersection(&right));
    if shared.is_empty() {
        return 0;
    }

    let left_combined = combine(&shared, &join(left.difference(&right)));
    let right_combined = combine(&shared, &join(right.difference(&left)));

    ratio(&shared, &left_combined)
        .max(ratio(&shared, &right_combined))
        .max(ratio(&left_combined, &right_combined))
}

/// Indel similarity `2·LCS / (|a| + |b|)` scaled to `[0, 100]`, rounded half to even.
fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = (a.len() + b.len()) as f64;
    let similarity = 2.0 * f64::from(lcs_chars(&a, &b)) / total;
    // Bounded to [0, 100] by construction.
    (similarity * 100.0).round_ties_even() as u8
}

fn join<'a>(tokens: impl Iterator<Item = &'a &'a str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn combine(shared: &str, rest: &str) -> String {
    format!("{shared} {rest}").trim().to_string()
}
