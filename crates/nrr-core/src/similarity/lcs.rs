//! Longest common subsequence length.

/// Length of the longest common subsequence of `query` and `text`, in chars.
///
/// Classic O(|query|·|text|) dynamic program; only two rows are kept since
/// the subsequence itself is never needed.
#[must_use]
pub fn lcs_length(query: &str, text: &str) -> u32 {
    let a: Vec<char> = query.chars().collect();
    let b: Vec<char> = text.chars().collect();
    lcs_chars(&a, &b)
}

pub(crate) fn lcs_chars(a: &[char], b: &[char]) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0u32; b.len() + 1];
    let mut curr = vec![0u32; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
