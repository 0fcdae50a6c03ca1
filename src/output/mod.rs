//! Output rendering for flow graph data.
//!
//! This module turns flow graphs into consumable formats:
//! - Budget-bounded text digests for LLM prompts

pub mod compress;

// Re-export main types and functions
pub use compress::{CompressInput, CompressOptions};
