//! Error types for Umbra

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum UmbraError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),
}

/// Result type alias
pub type UmbraResult<T> = Result<T, UmbraError>;
