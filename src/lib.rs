pub use bytes;
pub use log;

pub mod error;
pub use self::error::Error;

pub mod frame;

pub mod codec;

pub mod client;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
