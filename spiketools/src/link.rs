//! Serial transport to the board

use crate::cfg::Monitor;
use anyhow::{Context, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use tracing::info;

pub type Port = Box<dyn SerialPort>;

/// Open the port as 8N1 without flow control. Reads block for at most `timeout`.
pub fn open(name: &str, baud: u32, timeout: Duration) -> Result<Port> {
    let port = serialport::new(name, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(timeout)
        .open()
        .with_context(|| format!("could not open serial port {}", name))?;
    info!(port = name, baud, ?timeout, "serial port open");
    Ok(port)
}

pub fn open_monitor(cfg: &Monitor) -> Result<Port> {
    open(&cfg.port, cfg.baud, cfg.read_timeout)
}

/// Names of the serial ports present on this machine
pub fn available() -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Read until `quota` bytes have arrived, the port times out, or `budget`
/// is spent, whichever is first.
///
/// A serial port returns as soon as any bytes are available, so a single
/// `read` would often hand back a fraction of what is in flight. An error
/// after some bytes have arrived ends the read and keeps those bytes; an
/// error before anything arrived is returned.
pub fn read_quota(rdr: &mut impl Read, quota: usize, budget: Duration) -> io::Result<Vec<u8>> {
    let start = Instant::now();
    let mut buf = vec![0u8; quota];
    let mut n = 0;
    while n < quota {
        match rdr.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if n == 0 => return Err(e),
            Err(_) => break,
        }
        if start.elapsed() >= budget {
            break;
        }
    }
    buf.truncate(n);
    Ok(buf)
}

/// Send one byte and wait for the board to echo it back.
///
/// Returns `None` if nothing came back before the port's read timeout.
pub fn echo<P: Read + Write + ?Sized>(port: &mut P, value: u8) -> Result<Option<u8>> {
    port.write_all(&[value])?;
    port.flush()?;
    let mut b = [0u8; 1];
    loop {
        match port.read(&mut b) {
            Ok(1) => return Ok(Some(b[0])),
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("echo read failed"),
        }
    }
}
