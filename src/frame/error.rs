use thiserror::Error;

use super::{Address, FunctionCode, Quantity};

/// Caller input rejected before any I/O. Never retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quantity {quantity} outside the allowed range {min}..={max}")]
    QuantityOutOfRange {
        quantity: usize,
        min: Quantity,
        max: Quantity,
    },
    #[error("registers {address:#06X}..+{quantity} run past the end of the address space")]
    AddressOverflow { address: Address, quantity: Quantity },
}

/// A frame that could not be parsed. The connection has lost framing and
/// should be closed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame ends before the announced payload is complete")]
    Truncated,
    #[error("protocol identifier {0:#06X} is not Modbus/TCP")]
    ProtocolId(u16),
    #[error("unknown function code {0:#04X}")]
    UnknownFunction(u8),
    #[error("byte count {announced} disagrees with the {actual} data bytes received")]
    ByteCountMismatch { announced: u8, actual: usize },
    #[error("frame carries {0} bytes past the end of the payload")]
    TrailingBytes(usize),
}

/// A well-formed response that does not belong to the outstanding request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("transaction id mismatch: received {actual}, expected {expected}")]
    TransactionMismatch { expected: u16, actual: u16 },
    #[error("unit id mismatch: received {actual}, expected {expected}")]
    UnitMismatch { expected: u8, actual: u8 },
    #[error("function code mismatch: received {actual}, expected {expected}")]
    FunctionMismatch {
        expected: FunctionCode,
        actual: FunctionCode,
    },
    #[error("read returned {returned} registers, requested {requested}")]
    RegisterCount { requested: Quantity, returned: usize },
    #[error(
        "write echo {echoed_address:#06X}/{echoed_quantity} disagrees with \
         request {address:#06X}/{quantity}"
    )]
    EchoMismatch {
        address: Address,
        quantity: Quantity,
        echoed_address: Address,
        echoed_quantity: Quantity,
    },
}
