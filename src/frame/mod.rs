use std::{
    borrow::Cow,
    fmt::{self, Display},
};

pub mod error;
pub(crate) mod tcp;

pub use self::error::{FrameError, ProtocolError, ValidationError};
pub use self::tcp::{TransactionId, UnitId};

/// Starting address of a register block.
pub type Address = u16;

/// Number of registers covered by a request.
pub type Quantity = u16;

/// A single holding register, big-endian on the wire.
pub type Word = u16;

/// Protocol identifier carried by every Modbus/TCP frame.
pub const PROTOCOL_ID: u16 = 0x0000;

/// Size of the MBAP header on the wire.
pub const MBAP_HEADER_SIZE: usize = 7;

/// Last usable register address.
pub const ADDRESS_MAX: Address = 0xFFFF;

pub const QUANTITY_MIN: Quantity = 0x0001;

/// Largest register block a single Read Holding Registers request may cover.
pub const READ_QUANTITY_MAX: Quantity = 0x007D;

/// Largest register block a single Write Multiple Registers request may cover.
pub const WRITE_QUANTITY_MAX: Quantity = 0x007B;

/// IANA-assigned Modbus/TCP port.
pub const DEFAULT_PORT: u16 = 502;

/// Unit identifier used when none is configured. The unit id is a
/// deployment constant, not a protocol requirement.
pub const DEFAULT_UNIT_ID: UnitId = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    ReadHoldingRegisters,
    WriteMultipleRegisters,
}

impl FunctionCode {
    /// Create a new [`FunctionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        match value {
            0x03 => Some(Self::ReadHoldingRegisters),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// Wire value of the function code.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::ReadHoldingRegisters => 0x03,
            Self::WriteMultipleRegisters => 0x10,
        }
    }
}

impl Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04X}", self.value())
    }
}

/// A request from the client (master) to the server (slave).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// Read a contiguous block of holding registers (function code 0x03).
    ReadHoldingRegisters(Address, Quantity),

    /// Write a contiguous block of holding registers (function code 0x10).
    /// The quantity is the number of words.
    WriteMultipleRegisters(Address, Cow<'a, [Word]>),
}

impl<'a> Request<'a> {
    /// Converts the request into an owned instance with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> Request<'static> {
        use Request::*;
        match self {
            ReadHoldingRegisters(addr, qty) => ReadHoldingRegisters(addr, qty),
            WriteMultipleRegisters(addr, words) => {
                WriteMultipleRegisters(addr, Cow::Owned(words.into_owned()))
            }
        }
    }

    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Request::*;
        match self {
            ReadHoldingRegisters(_, _) => FunctionCode::ReadHoldingRegisters,
            WriteMultipleRegisters(_, _) => FunctionCode::WriteMultipleRegisters,
        }
    }

    /// Checks the address and quantity bounds.
    ///
    /// Runs before any bytes are produced; a rejected request causes no
    /// network activity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (address, quantity, max) = match self {
            Self::ReadHoldingRegisters(addr, qty) => (*addr, usize::from(*qty), READ_QUANTITY_MAX),
            Self::WriteMultipleRegisters(addr, words) => (*addr, words.len(), WRITE_QUANTITY_MAX),
        };
        if quantity < usize::from(QUANTITY_MIN) || quantity > usize::from(max) {
            return Err(ValidationError::QuantityOutOfRange {
                quantity,
                min: QUANTITY_MIN,
                max,
            });
        }
        if u32::from(address) + quantity as u32 > u32::from(ADDRESS_MAX) {
            return Err(ValidationError::AddressOverflow {
                address,
                quantity: quantity as Quantity,
            });
        }
        Ok(())
    }
}

/// A response from the server (slave) to the client (master).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The register values returned by a read, one [`Word`] per register.
    ReadHoldingRegisters(Vec<Word>),

    /// The echoed starting address and quantity confirming a write.
    WriteMultipleRegisters(Address, Quantity),
}

impl Response {
    #[must_use]
    pub const fn function_code(&self) -> FunctionCode {
        use Response::*;
        match self {
            ReadHoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            WriteMultipleRegisters(_, _) => FunctionCode::WriteMultipleRegisters,
        }
    }
}

/// A server (slave) exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
    /// 0x04
    ServerDeviceFailure,
    /// 0x05
    Acknowledge,
    /// 0x06
    ServerDeviceBusy,
    /// 0x08
    MemoryParityError,
    /// 0x0A
    GatewayPathUnavailable,
    /// 0x0B
    GatewayTargetDevice,
    /// None of the above.
    ///
    /// Although encoding one of the predefined values as this is possible, it is not recommended.
    /// Instead, prefer to use [`Self::new()`] to prevent such ambiguities.
    Custom(u8),
}

impl From<ExceptionCode> for u8 {
    fn from(from: ExceptionCode) -> Self {
        use ExceptionCode::*;
        match from {
            IllegalFunction => 0x01,
            IllegalDataAddress => 0x02,
            IllegalDataValue => 0x03,
            ServerDeviceFailure => 0x04,
            Acknowledge => 0x05,
            ServerDeviceBusy => 0x06,
            MemoryParityError => 0x08,
            GatewayPathUnavailable => 0x0A,
            GatewayTargetDevice => 0x0B,
            Custom(code) => code,
        }
    }
}

impl ExceptionCode {
    /// Create a new [`ExceptionCode`] with `value`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        use ExceptionCode::*;
        match value {
            0x01 => IllegalFunction,
            0x02 => IllegalDataAddress,
            0x03 => IllegalDataValue,
            0x04 => ServerDeviceFailure,
            0x05 => Acknowledge,
            0x06 => ServerDeviceBusy,
            0x08 => MemoryParityError,
            0x0A => GatewayPathUnavailable,
            0x0B => GatewayTargetDevice,
            other => Custom(other),
        }
    }

    pub(crate) fn description(&self) -> &str {
        use ExceptionCode::*;
        match *self {
            IllegalFunction => "Illegal function",
            IllegalDataAddress => "Illegal data address",
            IllegalDataValue => "Illegal data value",
            ServerDeviceFailure => "Server device failure",
            Acknowledge => "Acknowledge",
            ServerDeviceBusy => "Server device busy",
            MemoryParityError => "Memory parity error",
            GatewayPathUnavailable => "Gateway path unavailable",
            GatewayTargetDevice => "Gateway target device failed to respond",
            Custom(_) => "Custom",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for ExceptionCode {}

/// A server (slave) exception response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionResponse {
    pub function: FunctionCode,
    pub exception: ExceptionCode,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modbus function {}: {}", self.function, self.exception)
    }
}

impl std::error::Error for ExceptionResponse {}

/// Represents a message from the client (master) to the server (slave).
#[derive(Debug, Clone)]
pub(crate) struct RequestPdu<'a>(pub(crate) Request<'a>);

impl<'a> From<Request<'a>> for RequestPdu<'a> {
    fn from(from: Request<'a>) -> Self {
        RequestPdu(from)
    }
}

impl<'a> From<RequestPdu<'a>> for Request<'a> {
    fn from(from: RequestPdu<'a>) -> Self {
        from.0
    }
}

/// Represents a message from the server (slave) to the client (master).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponsePdu(pub(crate) Result<Response, ExceptionResponse>);

impl From<Response> for ResponsePdu {
    fn from(from: Response) -> Self {
        ResponsePdu(Ok(from))
    }
}

impl From<ExceptionResponse> for ResponsePdu {
    fn from(from: ExceptionResponse) -> Self {
        ResponsePdu(Err(from))
    }
}

impl From<ResponsePdu> for Result<Response, ExceptionResponse> {
    fn from(from: ResponsePdu) -> Self {
        from.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_function_code() {
        assert_eq!(
            FunctionCode::new(0x03),
            Some(FunctionCode::ReadHoldingRegisters)
        );
        assert_eq!(
            FunctionCode::new(0x10),
            Some(FunctionCode::WriteMultipleRegisters)
        );
        assert_eq!(FunctionCode::new(0x04), None);
        assert_eq!(FunctionCode::new(0x83), None);
    }

    #[test]
    fn function_code_values() {
        assert_eq!(FunctionCode::ReadHoldingRegisters.value(), 0x03);
        assert_eq!(FunctionCode::WriteMultipleRegisters.value(), 0x10);
    }

    #[test]
    fn exception_code_round_trip() {
        for value in 0x01..=0x0B {
            assert_eq!(u8::from(ExceptionCode::new(value)), value);
        }
        assert_eq!(ExceptionCode::new(0x02), ExceptionCode::IllegalDataAddress);
        assert_eq!(ExceptionCode::new(0x5A), ExceptionCode::Custom(0x5A));
    }

    #[test]
    fn read_quantity_bounds() {
        assert!(Request::ReadHoldingRegisters(0, 0).validate().is_err());
        assert!(Request::ReadHoldingRegisters(0, 1).validate().is_ok());
        assert!(Request::ReadHoldingRegisters(0, 125).validate().is_ok());
        assert!(Request::ReadHoldingRegisters(0, 126).validate().is_err());
    }

    #[test]
    fn write_quantity_bounds() {
        let words = vec![0u16; 124];
        assert!(
            Request::WriteMultipleRegisters(0, words[..0].into())
                .validate()
                .is_err()
        );
        assert!(
            Request::WriteMultipleRegisters(0, words[..123].into())
                .validate()
                .is_ok()
        );
        assert!(
            Request::WriteMultipleRegisters(0, words[..124].into())
                .validate()
                .is_err()
        );
    }

    #[test]
    fn address_overflow() {
        assert!(Request::ReadHoldingRegisters(65535, 2).validate().is_err());
        assert!(Request::ReadHoldingRegisters(65410, 125).validate().is_ok());
        assert!(Request::ReadHoldingRegisters(65411, 125).validate().is_err());
        assert_eq!(
            Request::ReadHoldingRegisters(65535, 1).validate(),
            Err(ValidationError::AddressOverflow {
                address: 65535,
                quantity: 1
            })
        );
    }
}
