use std::{fmt::Debug, io, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use futures_util::{sink::SinkExt as _, stream::StreamExt as _};
use socket2::{SockRef, TcpKeepalive};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt as _},
    net::TcpStream,
};
use tokio_util::codec::Framed;

use crate::{
    codec::tcp::ClientCodec,
    frame::{
        tcp::{verify_response_header, Header, RequestAdu, ResponseAdu},
        ProtocolError, Quantity, Request, Response, TransactionId, UnitId, DEFAULT_UNIT_ID,
    },
    Error, Result,
};

use super::{Client, Context};

const KEEPALIVE_TIME: Duration = Duration::from_secs(60);

/// Connects to `socket_addr` addressing the device as [`DEFAULT_UNIT_ID`].
pub async fn connect(socket_addr: SocketAddr) -> io::Result<Context<TcpClient>> {
    connect_unit(socket_addr, DEFAULT_UNIT_ID).await
}

/// Connects to `socket_addr` addressing the device as `unit_id`.
pub async fn connect_unit(
    socket_addr: SocketAddr,
    unit_id: UnitId,
) -> io::Result<Context<TcpClient>> {
    let client = TcpClient::connect_unit(socket_addr, unit_id).await?;
    Ok(Context::new(client))
}

/// A Modbus/TCP client over any byte stream.
///
/// One transaction is in flight at a time; transaction ids are assigned
/// from a per-connection counter wrapping modulo 65536.
#[derive(Debug)]
pub struct TcpClient<T = TcpStream> {
    framed: Framed<T, ClientCodec>,
    unit_id: UnitId,
    next_transaction_id: TransactionId,
}

impl TcpClient {
    pub async fn connect(socket_addr: SocketAddr) -> io::Result<Self> {
        Self::connect_unit(socket_addr, DEFAULT_UNIT_ID).await
    }

    pub async fn connect_unit(socket_addr: SocketAddr, unit_id: UnitId) -> io::Result<Self> {
        let stream = TcpStream::connect(socket_addr).await?;
        // A device that went away silently should eventually surface as a
        // dead connection, not only once a request is in flight.
        SockRef::from(&stream)
            .set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEPALIVE_TIME))?;
        log::debug!("connected to {socket_addr}, unit id {unit_id}");
        Ok(Self::attach_unit(stream, unit_id))
    }
}

impl<T> TcpClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-connected stream, addressing [`DEFAULT_UNIT_ID`].
    pub fn attach(stream: T) -> Self {
        Self::attach_unit(stream, DEFAULT_UNIT_ID)
    }

    pub fn attach_unit(stream: T, unit_id: UnitId) -> Self {
        Self {
            framed: Framed::new(stream, ClientCodec::new()),
            unit_id,
            next_transaction_id: 0,
        }
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        let id = self.next_transaction_id;
        self.next_transaction_id = id.wrapping_add(1);
        id
    }
}

#[async_trait]
impl<T> Client for TcpClient<T>
where
    T: AsyncRead + AsyncWrite + Debug + Send + Unpin,
{
    async fn call(&mut self, request: Request<'_>) -> Result<Response> {
        request.validate()?;

        let hdr = Header {
            transaction_id: self.next_transaction_id(),
            unit_id: self.unit_id,
        };
        log::debug!(
            "sending {} request as transaction {}",
            request.function_code(),
            hdr.transaction_id
        );

        self.framed
            .send(RequestAdu {
                hdr,
                pdu: request.clone().into(),
            })
            .await?;

        let ResponseAdu { hdr: rsp_hdr, pdu } = self.framed.next().await.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before a response arrived",
            )
        })??;

        verify_response_header(&hdr, &rsp_hdr)?;

        match pdu.0 {
            Ok(response) => {
                verify_response(&request, &response)?;
                Ok(response)
            }
            Err(exception) => {
                log::debug!("device replied with exception: {exception}");
                Err(Error::Exception(exception))
            }
        }
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        self.framed.get_mut().shutdown().await
    }
}

/// Checks that a response has the shape the request calls for.
fn verify_response(
    request: &Request<'_>,
    response: &Response,
) -> std::result::Result<(), ProtocolError> {
    match (request, response) {
        (Request::ReadHoldingRegisters(_, quantity), Response::ReadHoldingRegisters(words)) => {
            if words.len() != usize::from(*quantity) {
                return Err(ProtocolError::RegisterCount {
                    requested: *quantity,
                    returned: words.len(),
                });
            }
            Ok(())
        }
        (
            Request::WriteMultipleRegisters(address, words),
            Response::WriteMultipleRegisters(echoed_address, echoed_quantity),
        ) => {
            if echoed_address != address || usize::from(*echoed_quantity) != words.len() {
                return Err(ProtocolError::EchoMismatch {
                    address: *address,
                    quantity: words.len() as Quantity,
                    echoed_address: *echoed_address,
                    echoed_quantity: *echoed_quantity,
                });
            }
            Ok(())
        }
        _ => Err(ProtocolError::FunctionMismatch {
            expected: request.function_code(),
            actual: response.function_code(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Reader as _, Writer as _};
    use crate::frame::{ExceptionCode, ExceptionResponse, FunctionCode};
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    #[tokio::test]
    async fn read_holding_registers_end_to_end() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let server = tokio::spawn(async move {
            let mut request = [0u8; 12];
            server_side.read_exact(&mut request).await.unwrap();
            assert_eq!(
                request,
                [0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x79, 0x00, 0x04]
            );
            server_side
                .write_all(&[
                    0x00, 0x00, 0x00, 0x00, 0x00, 0x0B, 0x01, // MBAP header
                    0x03, 0x08, 0x00, 0x41, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                ])
                .await
                .unwrap();
        });

        let words = context.read_holding_registers(121, 4).await.unwrap();
        assert_eq!(words, [0x0041, 0x0000, 0x0000, 0x0000]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn transaction_ids_increment_per_request() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let server = tokio::spawn(async move {
            for transaction in 0u8..2 {
                let mut request = [0u8; 12];
                server_side.read_exact(&mut request).await.unwrap();
                assert_eq!(request[1], transaction);
                server_side
                    .write_all(&[
                        0x00, transaction, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x00, 0x2A,
                    ])
                    .await
                    .unwrap();
            }
        });

        for _ in 0..2 {
            let words = context.read_holding_registers(0, 1).await.unwrap();
            assert_eq!(words, [0x002A]);
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn write_exception_is_not_a_register_list() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let server = tokio::spawn(async move {
            let mut request = [0u8; 15];
            server_side.read_exact(&mut request).await.unwrap();
            server_side
                .write_all(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x01, 0x90, 0x02])
                .await
                .unwrap();
        });

        let err = context
            .write_multiple_registers(126, &[9999])
            .await
            .unwrap_err();
        match err {
            Error::Exception(ExceptionResponse {
                function,
                exception,
            }) => {
                assert_eq!(function, FunctionCode::WriteMultipleRegisters);
                assert_eq!(exception, ExceptionCode::IllegalDataAddress);
            }
            other => panic!("expected device exception, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn transaction_mismatch_is_fatal() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let server = tokio::spawn(async move {
            let mut request = [0u8; 12];
            server_side.read_exact(&mut request).await.unwrap();
            // well-formed PDU, wrong transaction id
            server_side
                .write_all(&[0x00, 0x07, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x00, 0x01])
                .await
                .unwrap();
        });

        let err = context.read_holding_registers(0, 1).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::TransactionMismatch {
                expected: 0,
                actual: 7,
            })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_quantity_causes_no_io() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let err = context.read_holding_registers(0, 0).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        drop(context);
        let mut sent = Vec::new();
        server_side.read_to_end(&mut sent).await.unwrap();
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn closed_connection_surfaces_as_eof() {
        let (client_side, mut server_side) = tokio::io::duplex(64);
        let mut context = Context::new(TcpClient::attach(client_side));

        let server = tokio::spawn(async move {
            let mut request = [0u8; 12];
            server_side.read_exact(&mut request).await.unwrap();
            // hang up without answering
        });

        let err = context.read_holding_registers(0, 1).await.unwrap_err();
        match err {
            Error::Transport(err) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected transport error, got {other:?}"),
        }
        server.await.unwrap();
    }
}
