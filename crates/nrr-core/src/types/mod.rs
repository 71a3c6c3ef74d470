pub mod frame;
pub mod record;
pub mod result;

pub use frame::Frame;
pub use record::{CandidateRecord, Query};
pub use result::{ResultSet, RetrievalHit, ScoredCandidate};
