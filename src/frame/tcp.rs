use super::*;

pub type TransactionId = u16;
pub type UnitId = u8;

/// The MBAP header fields that correlate a response with its request.
/// The protocol id and length are consumed by the codec and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) transaction_id: TransactionId,
    pub(crate) unit_id: UnitId,
}

#[derive(Debug, Clone)]
pub(crate) struct RequestAdu<'a> {
    pub(crate) hdr: Header,
    pub(crate) pdu: RequestPdu<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResponseAdu {
    pub(crate) hdr: Header,
    pub(crate) pdu: ResponsePdu,
}

impl<'a> From<RequestAdu<'a>> for Request<'a> {
    fn from(from: RequestAdu<'a>) -> Self {
        from.pdu.into()
    }
}

/// Checks that a response header echoes the request header. Unit id is
/// checked before the transaction id, matching the order a device would
/// reject them.
pub(crate) fn verify_response_header(req: &Header, rsp: &Header) -> Result<(), ProtocolError> {
    if rsp.unit_id != req.unit_id {
        return Err(ProtocolError::UnitMismatch {
            expected: req.unit_id,
            actual: rsp.unit_id,
        });
    }
    if rsp.transaction_id != req.transaction_id {
        return Err(ProtocolError::TransactionMismatch {
            expected: req.transaction_id,
            actual: rsp.transaction_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_echo() {
        let req = Header {
            transaction_id: 2,
            unit_id: 1,
        };
        assert!(verify_response_header(&req, &req).is_ok());
        assert_eq!(
            verify_response_header(
                &req,
                &Header {
                    transaction_id: 3,
                    unit_id: 1
                }
            ),
            Err(ProtocolError::TransactionMismatch {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(
            verify_response_header(
                &req,
                &Header {
                    transaction_id: 2,
                    unit_id: 51
                }
            ),
            Err(ProtocolError::UnitMismatch {
                expected: 1,
                actual: 51
            })
        );
    }
}
