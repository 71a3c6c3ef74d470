//! Smith–Waterman style local alignment over characters.

use std::ops::Range;

/// Reward for two equal characters.
pub const MATCH_REWARD: i32 = 2;
/// Penalty for two different characters.
pub const MISMATCH_PENALTY: i32 = -1;
/// Penalty for a gap in either string.
pub const GAP_PENALTY: i32 = -1;

/// Best local alignment found between two strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAlignment {
    pub score: u32,
    /// Aligned span of the query, in char positions.
    pub query_span: Range<usize>,
    /// Aligned span of the text, in char positions.
    pub text_span: Range<usize>,
}

/// Best local alignment score of `query` against `text`.
///
/// Cells are floored at zero and the maximum over the whole
/// `(|query|+1)×(|text|+1)` matrix is returned. Time and space are both
/// O(|query|·|text|); callers bound input length.
#[must_use]
pub fn alignment_score(query: &str, text: &str) -> u32 {
    let a: Vec<char> = query.chars().collect();
    let b: Vec<char> = text.chars().collect();
    align(&a, &b).score
}

/// Best local alignment of `query` against `text`, with the aligned spans.
///
/// The first cell reaching the maximum (row-major) ends the alignment.
#[must_use]
pub fn local_alignment(query: &str, text: &str) -> LocalAlignment {
    let a: Vec<char> = query.chars().collect();
    let b: Vec<char> = text.chars().collect();
    align(&a, &b)
}

fn substitution(x: char, y: char) -> i32 {
    if x == y { MATCH_REWARD } else { MISMATCH_PENALTY }
}

fn align(a: &[char], b: &[char]) -> LocalAlignment {
    let width = b.len() + 1;
    let mut matrix = vec![0i32; (a.len() + 1) * width];

    let mut max_score = 0;
    let (mut max_i, mut max_j) = (0, 0);

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let score = (matrix[(i - 1) * width + j - 1] + substitution(a[i - 1], b[j - 1]))
                .max(matrix[(i - 1) * width + j] + GAP_PENALTY)
                .max(matrix[i * width + j - 1] + GAP_PENALTY)
                .max(0);
            matrix[i * width + j] = score;
            if score > max_score {
                max_score = score;
                max_i = i;
                max_j = j;
            }
        }
    }

    let (end_i, end_j) = (max_i, max_j);
    let (mut i, mut j) = (max_i, max_j);
    while i > 0 && j > 0 && matrix[i * width + j] != 0 {
        let cell = matrix[i * width + j];
        if cell == matrix[(i - 1) * width + j - 1] + substitution(a[i - 1], b[j - 1]) {
            i -= 1;
            j -= 1;
        } else if cell == matrix[(i - 1) * width + j] + GAP_PENALTY {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    LocalAlignment {
        score: max_score.unsigned_abs(),
        query_span: i..end_i,
        text_span: j..end_j,
    }
}
