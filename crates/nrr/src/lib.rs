//! # NRR
//!
//! Re-ranks lexical search results for record matching. Each retrieved
//! candidate is scored against its query with fuzzy token-set, local
//! alignment and LCS signals, and a small feed-forward classifier decides
//! whether the pair is a match.
//!
//! This crate re-exports [`nrr_core`]; see there for the full API.

pub use nrr_core::*;
