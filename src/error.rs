//! Error types.

use thiserror::Error;

use crate::frame::{ExceptionResponse, FrameError, ProtocolError, ValidationError};

/// Anything that can go wrong during a single request/response exchange.
///
/// Device exceptions are a successfully decoded outcome and are kept
/// distinct from transport failures so callers can react differently,
/// e.g. not retry an illegal-address exception the way they would retry
/// a timeout.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was rejected before any bytes were written to the wire.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// A malformed or truncated frame was received. The connection is in
    /// an undefined framing position and should be closed.
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),
    /// The response does not belong to the outstanding request. Fatal for
    /// this connection, there is no mechanism to wait for the real one.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),
    /// The device answered with a _Modbus_ exception response.
    #[error(transparent)]
    Exception(#[from] ExceptionResponse),
    #[error(transparent)]
    Transport(#[from] std::io::Error),
}
