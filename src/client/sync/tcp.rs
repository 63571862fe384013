use std::{io, net::SocketAddr, time::Duration};

use tokio::runtime::Runtime;

use crate::client::tcp::TcpClient;
use crate::frame::{UnitId, DEFAULT_UNIT_ID};
use crate::{Error, Result};

use super::Context;

/// Default connect and per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects with the default unit id and timeouts.
pub fn connect(socket_addr: SocketAddr) -> Result<Context<TcpClient>> {
    connect_unit_with_timeout(socket_addr, DEFAULT_UNIT_ID, DEFAULT_TIMEOUT, Some(DEFAULT_TIMEOUT))
}

/// Connects addressing the device as `unit_id`, with default timeouts.
pub fn connect_unit(socket_addr: SocketAddr, unit_id: UnitId) -> Result<Context<TcpClient>> {
    connect_unit_with_timeout(socket_addr, unit_id, DEFAULT_TIMEOUT, Some(DEFAULT_TIMEOUT))
}

/// Connects with custom timeouts.
pub fn connect_with_timeout(
    socket_addr: SocketAddr,
    connect_timeout: Duration,
    operation_timeout: Option<Duration>,
) -> Result<Context<TcpClient>> {
    connect_unit_with_timeout(socket_addr, DEFAULT_UNIT_ID, connect_timeout, operation_timeout)
}

pub fn connect_unit_with_timeout(
    socket_addr: SocketAddr,
    unit_id: UnitId,
    connect_timeout: Duration,
    operation_timeout: Option<Duration>,
) -> Result<Context<TcpClient>> {
    let runtime = Runtime::new()?;

    let client = runtime.block_on(async {
        tokio::time::timeout(connect_timeout, TcpClient::connect_unit(socket_addr, unit_id))
            .await
            .map_err(|elapsed| io::Error::new(io::ErrorKind::TimedOut, elapsed))?
            .map_err(Error::Transport)
    })?;

    Ok(Context::new(client, runtime, operation_timeout))
}
