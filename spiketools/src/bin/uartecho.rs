use anyhow::Result;
use argh::FromArgs;
use std::io::{stdin, stdout, BufRead, Write};
use std::time::Duration;

use spiketools::{link, BAUD_DEFAULT};
use spiketools::cfg::PORT_DEFAULT;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Send single bytes typed at the prompt to the board and print what it
/// echoes back. Use this to check the serial link before running the
/// spike monitor. End input (Ctrl-D) to quit.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// list available serial ports and exit
    #[argh(switch, short = 'l')]
    pub list: bool,
    /// serial port name
    #[argh(option, default = "String::from(PORT_DEFAULT)")]
    pub port: String,
    /// baud rate
    #[argh(option, default = "BAUD_DEFAULT")]
    pub baud: u32,
    /// read timeout in ms
    #[argh(option, default = "100")]
    pub timeout: u64,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if args.list {
        let ports = link::available()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        }
        for p in ports {
            println!("{}", p);
        }
        return Ok(())
    }

    let mut port = link::open(&args.port, args.baud, Duration::from_millis(args.timeout))?;

    let stdin = stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter a number from 0 to 255: ");
        stdout().flush()?;
        let line = match lines.next() {
            Some(l) => l?,
            None => break,
        };
        match parse_byte(&line) {
            Ok(Some(b)) => {
                let echoed = link::echo(&mut port, b)?;
                // Nothing back reads as zero
                println!("{}", echoed.unwrap_or(0));
                std::thread::sleep(Duration::from_millis(100));
            },
            Ok(None) => {},
            Err(_) => println!("Not a number: {}", line.trim()),
        }
    }
    Ok(())
}

/// `Ok(None)` for integers outside a byte's range, which are ignored
fn parse_byte(s: &str) -> Result<Option<u8>, std::num::ParseIntError> {
    let n: i64 = s.trim().parse()?;
    Ok(u8::try_from(n).ok())
}
