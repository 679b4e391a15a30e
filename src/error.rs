//! Centralized error type for the stride umbrella crate.
//!
//! Wraps the core error so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] stride_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying core error, if this is one.
    pub fn as_core(&self) -> Option<&stride_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            Error::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
