//! Operator commands and the write path to the board

use anyhow::Result;
use spiketools::cfg::Monitor;
use spiketools::{img, ser, START_STREAMING, STOP_STREAMING};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

#[allow(unused_imports)]
use tracing::{debug, info, span, warn, Level};

use crate::{Shared, StopHandle};

/// Delay between leaving streaming mode and telling the board to stop
pub const PAUSE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// End the session
    Stop,
    /// Keep this many events on screen
    Show(usize),
    /// Blank the live view
    Clear,
    /// Ask the board to stop streaming
    Pause,
    /// Start streaming if needed and send the image
    Go,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    BadNumber,
    Unknown(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::BadNumber => write!(f, "Invalid number after show command."),
            ParseError::Unknown(_) => write!(f, "Not a legal command."),
        }
    }
}

impl std::error::Error for ParseError {}

impl Command {
    /// Parse one prompt line. Blank lines are `Ok(None)`; words after the
    /// command (and after the number for `show`) are ignored. A bare `show`
    /// means `show 0`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let mut words = line.split_whitespace();
        let cmd = match words.next() {
            Some(w) => w,
            None => return Ok(None),
        };
        let cmd = match cmd {
            "stop" => Command::Stop,
            "show" => {
                let n = match words.next() {
                    Some(w) => w.parse::<usize>().map_err(|_| ParseError::BadNumber)?,
                    None => 0,
                };
                Command::Show(n)
            },
            "clear" => Command::Clear,
            "pause" => Command::Pause,
            "go" => Command::Go,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(cmd))
    }
}

/// Result of running one prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do (blank line)
    Nothing,
    Done(String),
    /// Bad input or unusable image; state is unchanged
    Rejected(String),
    /// The session is over
    Stop,
}

/// Carries out commands against the shared state and the board.
///
/// Transport write errors are returned as `Err` and end the session; every
/// other problem comes back as [`Outcome::Rejected`].
pub struct Controller<W> {
    wtr: W,
    shared: Arc<Shared>,
    stop: StopHandle,
    image: PathBuf,
    max_act: u8,
    pause_delay: Duration,
}

impl<W: Write> Controller<W> {
    pub fn new(wtr: W, shared: Arc<Shared>, stop: StopHandle, cfg: &Monitor) -> Self {
        Controller {
            wtr,
            shared,
            stop,
            image: cfg.image.clone(),
            max_act: cfg.max_act(),
            pause_delay: PAUSE_DELAY,
        }
    }

    pub fn with_pause_delay(mut self, d: Duration) -> Self {
        self.pause_delay = d;
        self
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    pub fn writer(&self) -> &W {
        &self.wtr
    }

    pub fn execute_line(&mut self, line: &str) -> Result<Outcome> {
        match Command::parse(line) {
            Ok(Some(cmd)) => self.execute(cmd),
            Ok(None) => Ok(Outcome::Nothing),
            Err(e) => {
                debug!(line, "rejected: {}", e);
                Ok(Outcome::Rejected(e.to_string()))
            },
        }
    }

    pub fn execute(&mut self, cmd: Command) -> Result<Outcome> {
        let span = span!(Level::INFO, "command", ?cmd);
        let _enter = span.enter();
        let outcome = match cmd {
            Command::Stop => {
                self.stop.stop();
                Outcome::Stop
            },
            Command::Show(n) => {
                self.shared.view.lock().resize(n);
                Outcome::Done(format!("Showing {} events", n))
            },
            Command::Clear => {
                self.shared.view.lock().clear();
                Outcome::Done(String::from("Cleared"))
            },
            Command::Pause => {
                self.shared.streaming.store(false, Ordering::Release);
                std::thread::sleep(self.pause_delay);
                ser::write_command(&mut self.wtr, STOP_STREAMING)?;
                Outcome::Done(String::from("Paused"))
            },
            Command::Go => {
                if !self.shared.is_streaming() {
                    ser::write_command(&mut self.wtr, START_STREAMING)?;
                    self.shared.streaming.store(true, Ordering::Release);
                    info!("streaming started");
                }
                match img::load(&self.image, self.max_act) {
                    Ok(grid) => {
                        let n = ser::write_grid(&mut self.wtr, &grid)?;
                        Outcome::Done(format!("Sent {} ({} neurons)", self.image.display(), n))
                    },
                    Err(e) => {
                        warn!("image not sent: {:#}", e);
                        Outcome::Rejected(format!("{:#}", e))
                    },
                }
            },
        };
        info!(?outcome, "done");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("stop"), Ok(Some(Command::Stop)));
        assert_eq!(Command::parse("  show 25 "), Ok(Some(Command::Show(25))));
        assert_eq!(Command::parse("clear"), Ok(Some(Command::Clear)));
        assert_eq!(Command::parse("pause"), Ok(Some(Command::Pause)));
        assert_eq!(Command::parse("go now"), Ok(Some(Command::Go)));
        assert_eq!(Command::parse("show"), Ok(Some(Command::Show(0))));
        assert_eq!(Command::parse(""), Ok(None));
        assert_eq!(Command::parse("   "), Ok(None));
    }

    #[test]
    fn parse_rejects() {
        assert_eq!(Command::parse("show abc"), Err(ParseError::BadNumber));
        assert_eq!(Command::parse("show -4"), Err(ParseError::BadNumber));
        assert_eq!(Command::parse("Go"), Err(ParseError::Unknown(String::from("Go"))));
        assert_eq!(
            ParseError::Unknown(String::from("x")).to_string(),
            "Not a legal command.",
        );
    }
}
