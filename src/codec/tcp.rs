use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    frame::{
        tcp::{Header, RequestAdu, ResponseAdu},
        FrameError, Request, ResponsePdu, MBAP_HEADER_SIZE, PROTOCOL_ID,
    },
    Error,
};

#[derive(Debug, Default)]
pub(crate) struct ClientDecoder;

#[derive(Debug)]
pub(crate) struct ClientCodec {
    pub(crate) decoder: ClientDecoder,
}

impl ClientCodec {
    pub(crate) const fn new() -> Self {
        Self {
            decoder: ClientDecoder,
        }
    }
}

impl Decoder for ClientDecoder {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>, Error> {
        if buf.len() < MBAP_HEADER_SIZE {
            return Ok(None); // Need more data
        }

        let protocol_id = BigEndian::read_u16(&buf[2..4]);
        if protocol_id != PROTOCOL_ID {
            return Err(FrameError::ProtocolId(protocol_id).into());
        }

        // The length field counts every byte after itself: unit id + PDU.
        let length = usize::from(BigEndian::read_u16(&buf[4..6]));
        let Some(pdu_len) = length.checked_sub(1) else {
            return Err(FrameError::Truncated.into());
        };

        if buf.len() < MBAP_HEADER_SIZE + pdu_len {
            return Ok(None); // Keep reading until the whole ADU arrived
        }

        log::debug!(
            "client received frame: {:02X?}",
            &buf[..MBAP_HEADER_SIZE + pdu_len]
        );

        let header = buf.split_to(MBAP_HEADER_SIZE);
        let hdr = Header {
            transaction_id: BigEndian::read_u16(&header[0..2]),
            unit_id: header[6],
        };
        let pdu = ResponsePdu::try_from(buf.split_to(pdu_len).freeze())?;
        Ok(Some(ResponseAdu { hdr, pdu }))
    }
}

impl Decoder for ClientCodec {
    type Item = ResponseAdu;
    type Error = Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ResponseAdu>, Error> {
        self.decoder.decode(buf)
    }
}

impl<'a> Encoder<RequestAdu<'a>> for ClientCodec {
    type Error = Error;

    fn encode(&mut self, adu: RequestAdu<'a>, buf: &mut BytesMut) -> Result<(), Error> {
        let RequestAdu { hdr, pdu } = adu;
        let pdu_bytes = Bytes::try_from(Request::from(pdu))?;

        buf.reserve(MBAP_HEADER_SIZE + pdu_bytes.len());
        buf.put_u16(hdr.transaction_id);
        buf.put_u16(PROTOCOL_ID);
        buf.put_u16(pdu_bytes.len() as u16 + 1);
        buf.put_u8(hdr.unit_id);
        buf.put_slice(&pdu_bytes);
        Ok(())
    }
}
