//! Configuration tools: the settings a monitoring session runs with

use crate::img::MAX_ACT_DEFAULT;
use crate::ring::ON_SCREEN_DEFAULT;
use crate::BAUD_DEFAULT;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Monitor settings, read from a JSON file.
///
/// Every field may be left out of the file; missing fields take the
/// defaults below, which match the board's firmware. Durations are parsed
/// as in [humantime](https://docs.rs/humantime/), e.g. `"100ms"` or `"1s 5ms"`.
///
/// ```json
/// { "port": "/dev/ttyUSB1", "on_screen": 800, "poll_period": "50ms" }
/// ```
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct Monitor {
    /// Serial port name, e.g. `/dev/ttyUSB0` or `COM5`
    pub port:           String,
    pub baud:           u32,
    #[serde(with = "humantime_serde")]
    pub read_timeout:   Duration,
    #[serde(with = "humantime_serde")]
    pub poll_period:    Duration,
    /// Most bytes taken from the port per poll
    pub read_quota:     usize,
    /// Number of events kept in the live view
    pub on_screen:      usize,
    /// Activity level for a black pixel, in 0.25 Hz steps
    pub max_act:        u16,
    /// Image sent on `go`
    pub image:          PathBuf,
    /// Keep partial event records across polls instead of dropping them
    pub carry_partial:  bool,
}

impl Default for Monitor {
    fn default() -> Self {
        Monitor {
            port:           String::from(PORT_DEFAULT),
            baud:           BAUD_DEFAULT,
            read_timeout:   Duration::from_millis(100),
            poll_period:    Duration::from_millis(100),
            read_quota:     300,
            on_screen:      ON_SCREEN_DEFAULT,
            max_act:        MAX_ACT_DEFAULT as u16,
            image:          PathBuf::from("img.bmp"),
            carry_partial:  false,
        }
    }
}

#[cfg(windows)]
pub const PORT_DEFAULT: &str = "COM5";
#[cfg(not(windows))]
pub const PORT_DEFAULT: &str = "/dev/ttyUSB0";

impl Monitor {
    /// Read settings from a JSON file and check them
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("cannot open config {}", path.display()))?;
        let cfg: Monitor = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_act <= u8::MAX as u16, "max_act must fit in one byte, got {}", self.max_act);
        ensure!(self.read_quota > 0, "read_quota must be positive");
        ensure!(!self.poll_period.is_zero(), "poll_period must be positive");
        Ok(())
    }

    /// `max_act` as sent on the wire. Call [`Self::validate`] first.
    pub fn max_act(&self) -> u8 {
        self.max_act.min(u8::MAX as u16) as u8
    }
}
