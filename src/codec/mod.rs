use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt as _};
use bytes::{BufMut, Bytes, BytesMut};

use crate::frame::*;

#[cfg(feature = "tcp")]
pub(crate) mod tcp;

/// Exact size of the serialized request PDU.
fn request_pdu_len(req: &Request<'_>) -> usize {
    use crate::frame::Request::*;
    match *req {
        ReadHoldingRegisters(_, _) => 5,
        WriteMultipleRegisters(_, ref words) => 6 + words.len() * 2,
    }
}

impl<'a> TryFrom<Request<'a>> for Bytes {
    type Error = ValidationError;

    fn try_from(req: Request<'a>) -> Result<Bytes, ValidationError> {
        use crate::frame::Request::*;
        req.validate()?;

        let mut data = BytesMut::with_capacity(request_pdu_len(&req));
        data.put_u8(req.function_code().value());
        match req {
            ReadHoldingRegisters(address, quantity) => {
                data.put_u16(address);
                data.put_u16(quantity);
            }
            WriteMultipleRegisters(address, words) => {
                data.put_u16(address);
                data.put_u16(words.len() as u16);
                data.put_u8((words.len() * 2) as u8);
                for &word in words.iter() {
                    data.put_u16(word);
                }
            }
        }
        Ok(data.freeze())
    }
}

impl TryFrom<Bytes> for ResponsePdu {
    type Error = FrameError;

    fn try_from(bytes: Bytes) -> Result<Self, FrameError> {
        let Some(&fn_code) = bytes.first() else {
            return Err(FrameError::Truncated);
        };

        // An exception response is shorter than a normal one; classify it
        // before any length validation so it is never misread as truncated.
        if fn_code & 0x80 != 0 {
            let function =
                FunctionCode::new(fn_code & 0x7F).ok_or(FrameError::UnknownFunction(fn_code))?;
            let &code = bytes.get(1).ok_or(FrameError::Truncated)?;
            return Ok(ExceptionResponse {
                function,
                exception: ExceptionCode::new(code),
            }
            .into());
        }

        match FunctionCode::new(fn_code).ok_or(FrameError::UnknownFunction(fn_code))? {
            FunctionCode::ReadHoldingRegisters => {
                let &byte_count = bytes.get(1).ok_or(FrameError::Truncated)?;
                let data = &bytes[2..];
                if data.len() < usize::from(byte_count) {
                    return Err(FrameError::Truncated);
                }
                if data.len() != usize::from(byte_count) || byte_count % 2 != 0 {
                    return Err(FrameError::ByteCountMismatch {
                        announced: byte_count,
                        actual: data.len(),
                    });
                }
                let mut rdr = Cursor::new(data);
                let mut words = Vec::with_capacity(usize::from(byte_count) / 2);
                for _ in 0..byte_count / 2 {
                    let word = rdr
                        .read_u16::<BigEndian>()
                        .map_err(|_| FrameError::Truncated)?;
                    words.push(word);
                }
                Ok(Response::ReadHoldingRegisters(words).into())
            }
            FunctionCode::WriteMultipleRegisters => {
                // The echo is fixed-size; anything longer means the
                // stream has lost framing.
                if bytes.len() < 5 {
                    return Err(FrameError::Truncated);
                }
                if bytes.len() > 5 {
                    return Err(FrameError::TrailingBytes(bytes.len() - 5));
                }
                let mut rdr = Cursor::new(&bytes[1..]);
                let address = rdr
                    .read_u16::<BigEndian>()
                    .map_err(|_| FrameError::Truncated)?;
                let quantity = rdr
                    .read_u16::<BigEndian>()
                    .map_err(|_| FrameError::Truncated)?;
                Ok(Response::WriteMultipleRegisters(address, quantity).into())
            }
        }
    }
}
