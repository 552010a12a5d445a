//! Shared error taxonomy and result type for argonaut.

#![forbid(unsafe_code)]

mod error;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
