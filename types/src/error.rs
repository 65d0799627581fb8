//! Errors raised while constructing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("basis points must be within 0..=10000, got {0}")]
    InvalidBasisPoints(u32),

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
}
