pub mod grouping;
pub mod simd_helpers;
