pub mod app;
pub mod control;
pub mod poll;
pub mod terminal;
pub mod timer;
pub mod ui;

use anyhow::Result;
use argh::FromArgs;
use parking_lot::Mutex;
use spiketools::cfg::Monitor;
use spiketools::ring::EventRing;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, FromArgs, Clone, Default)]
/// Send images to the neuromorphic board and watch the spikes it returns.
/// Type commands at the prompt: go, pause, show <n>, clear, stop.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// serial port name
    #[argh(option)]
    pub port: Option<String>,
    /// baud rate
    #[argh(option)]
    pub baud: Option<u32>,
    /// image sent on `go`
    #[argh(option)]
    pub image: Option<String>,
    /// config file path (JSON)
    #[argh(option)]
    pub config: Option<String>,
    /// redraw period in ms
    #[argh(option, default = "100")]
    pub tick_rate: u64,
    /// use unicode graphics
    #[argh(option, default = "true")]
    pub enhanced_graphics: bool,
    /// keep incomplete event records for the next read instead of dropping them
    #[argh(switch)]
    pub carry_partial: bool,
    /// write logs to this file
    #[argh(option)]
    pub log: Option<String>,
}

impl CliArgs {
    /// Settings from the config file, if any, with command line options on top
    pub fn monitor(&self) -> Result<Monitor> {
        let mut cfg = match &self.config {
            Some(c) => Monitor::from_file(c)?,
            None => Monitor::default(),
        };
        if let Some(p) = &self.port {
            cfg.port = p.clone();
        }
        if let Some(b) = self.baud {
            cfg.baud = b;
        }
        if let Some(i) = &self.image {
            cfg.image = PathBuf::from(i);
        }
        cfg.carry_partial |= self.carry_partial;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// State shared by the command side and the poll thread
pub struct Shared {
    /// Events on screen
    pub view: Mutex<EventRing>,
    /// Whether the board has been asked to stream events
    pub streaming: AtomicBool,
}

impl Shared {
    pub fn new(on_screen: usize) -> Self {
        Shared {
            view: Mutex::new(EventRing::new(on_screen)),
            streaming: AtomicBool::new(false),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }
}

/// One-shot stop signal for the poll thread. Dropping the handle also stops it.
pub struct StopHandle {
    tx: Option<flume::Sender<()>>,
}

impl StopHandle {
    pub fn stop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tx.is_none()
    }
}

pub fn stop_channel() -> (StopHandle, flume::Receiver<()>) {
    let (tx, rx) = flume::bounded(1);
    (StopHandle { tx: Some(tx) }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_defaults() {
        let args = CliArgs {
            port: Some(String::from("COM7")),
            image: Some(String::from("face.png")),
            carry_partial: true,
            ..Default::default()
        };
        let cfg = args.monitor().unwrap();
        assert_eq!(cfg.port, "COM7");
        assert_eq!(cfg.baud, 115_200);
        assert_eq!(cfg.image, PathBuf::from("face.png"));
        assert!(cfg.carry_partial);
    }

    #[test]
    fn stop_is_one_shot() {
        let (mut stop, rx) = stop_channel();
        assert!(!stop.is_stopped());
        stop.stop();
        stop.stop();
        assert!(stop.is_stopped());
        assert_eq!(rx.try_recv(), Ok(()));
        assert!(rx.try_recv().is_err());
    }
}
