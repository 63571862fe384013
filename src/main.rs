use std::{
    env,
    net::{IpAddr, SocketAddr},
    process, thread,
    time::Duration,
};

use tokio_mbtcp::{
    client::sync::{tcp, Reader as _, Writer as _},
    frame::DEFAULT_PORT,
    Result,
};

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(ip) = args.next() else {
        eprintln!("Usage: modbus-poll <ip> [port]");
        process::exit(2);
    };
    let ip: IpAddr = match ip.parse() {
        Ok(ip) => ip,
        Err(err) => {
            eprintln!("invalid ip address {ip:?}: {err}");
            process::exit(2);
        }
    };
    let port: u16 = match args.next().as_deref().map(str::parse) {
        Some(Ok(port)) => port,
        Some(Err(err)) => {
            eprintln!("invalid port: {err}");
            process::exit(2);
        }
        None => DEFAULT_PORT,
    };

    if let Err(err) = poll(SocketAddr::new(ip, port)) {
        log::error!("{err}");
        process::exit(1);
    }
}

/// Reads a register block and bumps a counter register, once a second.
fn poll(addr: SocketAddr) -> Result<()> {
    let mut context = tcp::connect(addr)?;
    log::info!("connected to {addr}");

    let mut value: u16 = 0;
    loop {
        let words = context.read_holding_registers(0, 10)?;
        println!("Reply: {words:04X?}");

        let confirmed = context.write_multiple_registers(7, &[value])?;
        log::info!("wrote {confirmed} register(s) at address 7");

        value = value.wrapping_add(1);
        thread::sleep(Duration::from_secs(1));
    }
}
