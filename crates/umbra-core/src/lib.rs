//! umbra-core: Shared types for the Umbra reverb engine
//!
//! This crate provides the foundational types used across all Umbra crates:
//! sample aliases, stereo/mid-side conversions, error types, and the
//! host-facing parameter model.

mod error;
mod params;
mod sample;

pub use error::*;
pub use params::*;
pub use sample::*;
