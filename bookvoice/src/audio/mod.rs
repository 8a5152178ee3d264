//! Audio reassembly: merging per-chunk files back into per-section artifacts.

mod merger;

pub use merger::merge_groups;
