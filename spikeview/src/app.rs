use crate::control::{Controller, Outcome};
use crate::poll::Frame;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::io::Write;
use std::time::Instant;

pub enum Event<I> {
    Input(I),
    Tick,
}

/// Last answer to a prompt line, shown under the prompt
pub struct Reply {
    pub ok: bool,
    pub text: String,
}

pub struct App<'a, W> {
    pub title: &'a str,
    pub enhanced_graphics: bool,
    pub should_quit: bool,
    /// Prompt line being typed
    pub input: String,
    pub reply: Option<Reply>,
    /// Most recent view of the rolling buffer
    pub frame: Frame,
    pub event_rate: f64,
    pub last_read: Instant,
    received: usize,
    controller: Controller<W>,
    rx_frame: flume::Receiver<Frame>,
}

impl<'a, W: Write> App<'a, W> {
    pub fn new(
        title: &'a str,
        enhanced_graphics: bool,
        controller: Controller<W>,
        rx_frame: flume::Receiver<Frame>,
    ) -> App<'a, W>
    {
        let frame = Frame::from_ring(&controller.shared().view.lock(), 0);
        App {
            title,
            enhanced_graphics,
            should_quit: false,
            input: String::new(),
            reply: None,
            frame,
            event_rate: 0.0,
            last_read: Instant::now(),
            received: 0,
            controller,
            rx_frame,
        }
    }

    /// Edit the prompt; Enter runs it. Ctrl-C is the same as `stop`.
    pub fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                self.submit("stop")?;
            },
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            },
            KeyCode::Esc => self.input.clear(),
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                self.submit(&line)?;
            },
            _ => {},
        }
        Ok(())
    }

    /// Run one prompt line. Only transport failures are errors.
    pub fn submit(&mut self, line: &str) -> Result<()> {
        match self.controller.execute_line(line)? {
            Outcome::Nothing => {},
            Outcome::Done(text) => {
                self.reply = Some(Reply { ok: true, text });
                // show/clear take effect on screen right away
                self.frame = Frame::from_ring(&self.controller.shared().view.lock(), 0);
            },
            Outcome::Rejected(text) => {
                self.reply = Some(Reply { ok: false, text });
            },
            Outcome::Stop => self.should_quit = true,
        }
        Ok(())
    }

    pub fn on_tick(&mut self) {
        let mut fresh = false;
        for frame in self.rx_frame.try_iter() {
            self.received += frame.received;
            fresh = true;
        }
        // the ring is newer than any queued frame, e.g. after `clear`
        if fresh {
            self.frame = Frame::from_ring(&self.controller.shared().view.lock(), 0);
        }

        let time = self.last_read.elapsed().as_secs_f64();
        if time >= 1.0 {
            self.event_rate = self.received as f64 / time;
            self.received = 0;
            self.last_read = Instant::now();
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.controller.shared().is_streaming()
    }

    pub fn capacity(&self) -> usize {
        self.frame.times.len()
    }
}
