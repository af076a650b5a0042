//! Operations that combine two images.

mod difference;
mod histogram;

pub use difference::{find_difference, structural_similarity, Difference, SsimParams};
pub use histogram::transfer_histogram;
