#![doc = include_str!(concat!(env!("OUT_DIR"), "/README-rustdocified.md"))]
#![deny(missing_docs)]

pub use crate::codec::{create, recovery_threshold, Error, ReedSolomon, Shard};

#[cfg(test)]
mod test_util;

mod codec;
mod math;

pub mod algorithm {
    #![doc = include_str!("algorithm.md")]
}
pub mod field;
pub mod transform;

// ======================================================================
// TESTS
