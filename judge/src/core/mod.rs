//! Shared judging primitives: output normalization and verdict types

pub mod normalize;
pub mod verdict;

pub use normalize::{normalize, outputs_match};
pub use verdict::{Verdict, VerdictKind};
