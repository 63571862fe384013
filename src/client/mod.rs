#[cfg(feature = "sync")]
pub mod sync;
#[cfg(feature = "tcp")]
pub mod tcp;

use std::{borrow::Cow, fmt::Debug, io};

use async_trait::async_trait;

use crate::frame::*;
use crate::Result;

#[async_trait]
pub trait Client: Send + Debug {
    /// Invokes a _Modbus_ function.
    async fn call(&mut self, request: Request<'_>) -> Result<Response>;

    /// Shuts the underlying transport down.
    async fn disconnect(&mut self) -> io::Result<()>;
}

#[async_trait]
pub trait Reader: Client {
    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> Result<Vec<Word>>;
}

#[async_trait]
pub trait Writer: Client {
    /// Returns the quantity of registers the device confirmed written.
    async fn write_multiple_registers(
        &mut self,
        addr: Address,
        words: &[Word],
    ) -> Result<Quantity>;
}

/// Asynchronous Modbus client context with generic transport.
#[derive(Debug)]
pub struct Context<T: Client> {
    client: T,
}

impl<T: Client> Context<T> {
    pub fn new(client: T) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Client> Client for Context<T> {
    async fn call(&mut self, request: Request<'_>) -> Result<Response> {
        self.client.call(request).await
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        self.client.disconnect().await
    }
}

#[async_trait]
impl<T: Client> Reader for Context<T> {
    async fn read_holding_registers(
        &mut self,
        addr: Address,
        cnt: Quantity,
    ) -> Result<Vec<Word>> {
        let response = self
            .client
            .call(Request::ReadHoldingRegisters(addr, cnt))
            .await?;
        match response {
            Response::ReadHoldingRegisters(words) => Ok(words),
            _ => unreachable!("call() verifies that the response matches the request"),
        }
    }
}

#[async_trait]
impl<T: Client> Writer for Context<T> {
    async fn write_multiple_registers(
        &mut self,
        addr: Address,
        words: &[Word],
    ) -> Result<Quantity> {
        let response = self
            .client
            .call(Request::WriteMultipleRegisters(addr, Cow::Borrowed(words)))
            .await?;
        match response {
            Response::WriteMultipleRegisters(_, quantity) => Ok(quantity),
            _ => unreachable!("call() verifies that the response matches the request"),
        }
    }
}
