//! Matroska output synthesis.
//!
//! Output is produced incrementally: a document preamble before the first
//! frame, then one self-contained Cluster holding a single SimpleBlock per
//! frame. The Segment is written with an unknown size so that no element
//! has to be revisited once emitted.

pub mod ebml;
mod error;
pub mod nal;
mod writer;

pub use error::MkvError;
pub use writer::{MkvWriter, CLUSTER_OVERHEAD, MUXING_APP};

/// Result type for Matroska operations.
pub type MkvResult<T> = Result<T, MkvError>;
