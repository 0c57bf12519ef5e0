use anyhow::{bail, Result};
use spiketools::cfg::Monitor;
use spiketools::de::{self, Reassembler};
use spiketools::link;
use spiketools::ring::EventRing;
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[allow(unused_imports)]
use tracing::{debug, info, span, trace, warn, Level};

use crate::Shared;

/// Snapshot of the rolling buffer handed to the display
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub times: Vec<u16>,
    pub addresses: Vec<u8>,
    /// Events that arrived in the poll that produced this frame
    pub received: usize,
}

impl Frame {
    pub fn from_ring(ring: &EventRing, received: usize) -> Self {
        let (times, addresses) = ring.snapshot();
        Frame { times, addresses, received }
    }
}

/// Where rendered frames go. A sink that is not ready just misses that frame.
pub trait Sink {
    fn render(&mut self, frame: Frame) -> Result<()>;
}

/// One-slot mailbox to the display where the newest frame wins.
///
/// A frame still waiting when the next one arrives is replaced, and its
/// `received` count is carried into the replacement so the rate stays exact.
pub struct Latest {
    tx: flume::Sender<Frame>,
    rx: flume::Receiver<Frame>,
}

pub fn latest() -> (Latest, flume::Receiver<Frame>) {
    let (tx, rx) = flume::bounded(1);
    (Latest { tx, rx: rx.clone() }, rx)
}

impl Sink for Latest {
    fn render(&mut self, frame: Frame) -> Result<()> {
        // our own receiver keeps the channel open, so count the display's
        if self.tx.receiver_count() < 2 {
            bail!("display closed");
        }
        let mut frame = match self.tx.try_send(frame) {
            Ok(()) => return Ok(()),
            Err(flume::TrySendError::Full(f)) => f,
            Err(flume::TrySendError::Disconnected(_)) => bail!("display closed"),
        };
        if let Ok(stale) = self.rx.try_recv() {
            frame.received += stale.received;
        }
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(_) => bail!("display busy"),
        }
    }
}

/// What happened during one poll
#[derive(Debug)]
pub enum TickOutcome {
    /// Events were decoded; `dropped` trailing bytes did not form a record.
    /// `streaming` is whether the board had been asked to stream.
    Events { count: usize, dropped: usize, streaming: bool },
    /// Nothing arrived before the read timed out
    Idle,
    /// The read failed; the tick was skipped
    Transport(io::Error),
}

/// Read path: transport → decoder → rolling buffer → display
pub struct Poller<R, S> {
    rdr: R,
    sink: S,
    shared: Arc<Shared>,
    quota: usize,
    budget: Duration,
    carry: Option<Reassembler>,
}

impl<R: Read, S: Sink> Poller<R, S> {
    pub fn new(rdr: R, sink: S, shared: Arc<Shared>, cfg: &Monitor) -> Self {
        Poller {
            rdr,
            sink,
            shared,
            quota: cfg.read_quota,
            budget: cfg.read_timeout,
            carry: if cfg.carry_partial { Some(Reassembler::new()) } else { None },
        }
    }

    /// Read once, decode, push and render
    pub fn tick(&mut self) -> TickOutcome {
        let bytes = match link::read_quota(&mut self.rdr, self.quota, self.budget) {
            Ok(b) => b,
            Err(e) => return TickOutcome::Transport(e),
        };
        if bytes.is_empty() {
            return TickOutcome::Idle;
        }
        let decoded = match self.carry.as_mut() {
            Some(r) => r.feed(&bytes),
            None => de::events(&bytes),
        };
        let count = decoded.events.len();
        if count > 0 {
            let frame = {
                let mut view = self.shared.view.lock();
                view.push(&decoded.events);
                Frame::from_ring(&view, count)
            };
            if let Err(e) = self.sink.render(frame) {
                trace!("frame skipped: {}", e);
            }
        }
        TickOutcome::Events {
            count,
            dropped: decoded.dropped,
            streaming: self.shared.is_streaming(),
        }
    }

    /// Poll every `period` until `stop` fires or its sender goes away
    pub fn run(mut self, stop: flume::Receiver<()>, period: Duration) {
        let span = span!(Level::INFO, "poll");
        let _enter = span.enter();
        info!(?period, quota = self.quota, "polling");
        loop {
            match stop.recv_timeout(period) {
                Err(flume::RecvTimeoutError::Timeout) => {},
                _ => break,
            }
            match self.tick() {
                TickOutcome::Events { count, dropped, streaming } => {
                    trace!(count, streaming, "events");
                    if dropped > 0 {
                        debug!(dropped, "partial record discarded");
                    }
                    if count > 0 && !streaming {
                        debug!(count, "events while paused");
                    }
                },
                TickOutcome::Idle => {},
                TickOutcome::Transport(e) => debug!("read failed, tick skipped: {}", e),
            }
        }
        info!("poll loop stopped");
    }
}

/// Run the poll loop on its own thread. The sink is dropped when the loop ends.
pub fn spawn<R, S>(poller: Poller<R, S>, stop: flume::Receiver<()>, period: Duration) -> JoinHandle<()>
where
    R: Read + Send + 'static,
    S: Sink + Send + 'static,
{
    std::thread::spawn(move || poller.run(stop, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiketools::{ser, Event};

    struct Collect(Vec<Frame>);

    impl Sink for Collect {
        fn render(&mut self, frame: Frame) -> Result<()> {
            self.0.push(frame);
            Ok(())
        }
    }

    struct Refuse(usize);

    impl Sink for Refuse {
        fn render(&mut self, _: Frame) -> Result<()> {
            self.0 += 1;
            bail!("not ready")
        }
    }

    fn cfg(on_screen: usize) -> Monitor {
        Monitor { on_screen, ..Default::default() }
    }

    #[test]
    fn tick_pushes_and_renders() {
        let events = vec![Event { time: 1, address: 42 }, Event { time: 2, address: 7 }];
        let mut bytes = ser::events(&events);
        bytes.push(0xAA);
        let shared = Arc::new(Shared::new(4));
        let mut p = Poller::new(&bytes[..], Collect(Vec::new()), shared.clone(), &cfg(4));

        match p.tick() {
            TickOutcome::Events { count, dropped, streaming } => {
                assert_eq!(count, 2);
                assert_eq!(dropped, 1);
                assert!(!streaming);
            },
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(shared.view.lock().times(), vec![0, 0, 1, 2]);
        assert_eq!(p.sink.0.len(), 1);
        assert_eq!(p.sink.0[0].addresses, vec![0, 0, 42, 7]);
        assert_eq!(p.sink.0[0].received, 2);

        // Reader is exhausted now
        assert!(matches!(p.tick(), TickOutcome::Idle));
        assert_eq!(p.sink.0.len(), 1);
    }

    #[test]
    fn refused_frames_do_not_stop_polling() {
        let bytes = ser::events(&[Event { time: 3, address: 3 }; 10]);
        let shared = Arc::new(Shared::new(400));
        let mut p = Poller::new(&bytes[..], Refuse(0), shared.clone(), &cfg(400));
        assert!(matches!(p.tick(), TickOutcome::Events { count: 10, .. }));
        assert_eq!(p.sink.0, 1);
        assert_eq!(shared.view.lock().times()[399], 3);
    }

    #[test]
    fn transport_error_is_reported() {
        struct Unplugged;
        impl Read for Unplugged {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            }
        }
        let shared = Arc::new(Shared::new(4));
        let mut p = Poller::new(Unplugged, Collect(Vec::new()), shared, &cfg(4));
        assert!(matches!(p.tick(), TickOutcome::Transport(_)));
        assert!(p.sink.0.is_empty());
    }

    #[test]
    fn carry_partial_keeps_split_record() {
        let bytes = [0x00, 0x01, 0x2A, 0x00];
        let shared = Arc::new(Shared::new(2));
        let cfg = Monitor { on_screen: 2, carry_partial: true, ..Default::default() };
        let mut p = Poller::new(&bytes[..], Collect(Vec::new()), shared.clone(), &cfg);
        assert!(matches!(p.tick(), TickOutcome::Events { count: 1, dropped: 0, .. }));
        p.rdr = &[0x09, 0x05][..];
        assert!(matches!(p.tick(), TickOutcome::Events { count: 1, dropped: 0, .. }));
        assert_eq!(shared.view.lock().times(), vec![1, 9]);
        assert_eq!(shared.view.lock().addresses(), vec![42, 5]);
    }

    #[test]
    fn stop_ends_poll_thread() {
        let shared = Arc::new(Shared::new(4));
        let p = Poller::new(io::empty(), Collect(Vec::new()), shared, &cfg(4));
        let (mut stop, stopped) = crate::stop_channel();
        let handle = spawn(p, stopped, Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        stop.stop();
        assert!(handle.join().is_ok());
    }

    #[test]
    fn dropped_stop_handle_ends_poll_thread() {
        let shared = Arc::new(Shared::new(4));
        let p = Poller::new(io::empty(), Collect(Vec::new()), shared, &cfg(4));
        let (stop, stopped) = crate::stop_channel();
        let handle = spawn(p, stopped, Duration::from_secs(60));
        drop(stop);
        assert!(handle.join().is_ok());
    }

    #[test]
    fn newest_frame_wins() {
        let first = ser::events(&[Event { time: 1, address: 10 }]);
        let second = ser::events(&[Event { time: 2, address: 20 }; 2]);
        let (sink, rx) = latest();
        let shared = Arc::new(Shared::new(4));
        let mut p = Poller::new(&first[..], sink, shared.clone(), &cfg(4));

        // two polls land before the display looks
        assert!(matches!(p.tick(), TickOutcome::Events { count: 1, .. }));
        p.rdr = &second[..];
        assert!(matches!(p.tick(), TickOutcome::Events { count: 2, .. }));

        let frames: Vec<Frame> = rx.try_iter().collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].times, shared.view.lock().times());
        assert_eq!(frames[0].times, vec![0, 1, 2, 2]);
        assert_eq!(frames[0].received, 3);
    }

    #[test]
    fn outcome_reports_streaming_flag() {
        let bytes = ser::events(&[Event { time: 4, address: 4 }]);
        let shared = Arc::new(Shared::new(4));
        shared.streaming.store(true, std::sync::atomic::Ordering::Release);
        let mut p = Poller::new(&bytes[..], Collect(Vec::new()), shared, &cfg(4));
        assert!(matches!(p.tick(), TickOutcome::Events { count: 1, streaming: true, .. }));
    }

    #[test]
    fn latest_reports_closed_display() {
        let (mut sink, rx) = latest();
        assert!(sink.render(Frame::default()).is_ok());
        assert!(sink.render(Frame::default()).is_ok());
        assert_eq!(rx.len(), 1);
        drop(rx);
        assert!(sink.render(Frame::default()).is_err());
    }
}
