//! Blocking variants of the client API.
//!
//! Each [`Context`] owns a dedicated tokio runtime and drives the async
//! client to completion per call, optionally bounded by a per-operation
//! timeout.

use futures_util::future::Either;
use std::{future::Future, io, time::Duration};
use tokio::runtime::Runtime;

use crate::frame::{Address, Quantity, Request, Response, Word};
use crate::Result;

use super::{Client as AsyncClient, Context as AsyncContext, Reader as _, Writer as _};

#[cfg(feature = "tcp")]
pub mod tcp;

fn block_on_with_timeout<T, E>(
    runtime: &Runtime,
    timeout: Option<Duration>,
    task: impl Future<Output = std::result::Result<T, E>>,
) -> std::result::Result<T, E>
where
    E: From<io::Error>,
{
    let task = if let Some(duration) = timeout {
        Either::Left(async move {
            tokio::time::timeout(duration, task)
                .await
                .unwrap_or_else(|elapsed| {
                    Err(io::Error::new(io::ErrorKind::TimedOut, elapsed).into())
                })
        })
    } else {
        Either::Right(task)
    };
    runtime.block_on(task)
}

/// A transport independent synchronous client trait.
pub trait Client {
    fn call(&mut self, request: Request<'_>) -> Result<Response>;
}

pub trait Reader: Client {
    fn read_holding_registers(&mut self, addr: Address, cnt: Quantity) -> Result<Vec<Word>>;
}

pub trait Writer: Client {
    /// Returns the quantity of registers the device confirmed written.
    fn write_multiple_registers(&mut self, addr: Address, words: &[Word]) -> Result<Quantity>;
}

#[derive(Debug)]
pub struct Context<T: AsyncClient> {
    runtime: Runtime,
    async_ctx: AsyncContext<T>,
    timeout: Option<Duration>,
}

impl<T: AsyncClient> Context<T> {
    pub fn new(client: T, runtime: Runtime, timeout: Option<Duration>) -> Self {
        Self {
            async_ctx: AsyncContext::new(client),
            runtime,
            timeout,
        }
    }

    /// The per-operation timeout. `None` blocks indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: impl Into<Option<Duration>>) {
        self.timeout = timeout.into();
    }

    /// Releases the connection, bounded by the per-operation timeout
    /// like any other call. After a timeout the framing position is
    /// undefined; disconnect and reconnect instead of reusing the
    /// context.
    pub fn disconnect(&mut self) -> io::Result<()> {
        block_on_with_timeout(&self.runtime, self.timeout, self.async_ctx.disconnect())
    }
}

impl<T: AsyncClient> Client for Context<T> {
    fn call(&mut self, request: Request<'_>) -> Result<Response> {
        block_on_with_timeout(&self.runtime, self.timeout, self.async_ctx.call(request))
    }
}

impl<T: AsyncClient> Reader for Context<T> {
    fn read_holding_registers(&mut self, addr: Address, cnt: Quantity) -> Result<Vec<Word>> {
        block_on_with_timeout(
            &self.runtime,
            self.timeout,
            self.async_ctx.read_holding_registers(addr, cnt),
        )
    }
}

impl<T: AsyncClient> Writer for Context<T> {
    fn write_multiple_registers(&mut self, addr: Address, words: &[Word]) -> Result<Quantity> {
        block_on_with_timeout(
            &self.runtime,
            self.timeout,
            self.async_ctx.write_multiple_registers(addr, words),
        )
    }
}
