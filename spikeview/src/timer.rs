use anyhow::Result;
use crossterm::event::{self, Event as CEvent, KeyEvent};
use std::time::{Duration, Instant};
use crate::app::Event;

/// Forward key presses and send a tick every `tick_rate`. Ends once the
/// receiving side is gone.
pub fn main(tx_event: flume::Sender<Event<KeyEvent>>, tick_rate: Duration) -> Result<()> {
    let _ = std::thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            // poll for tick rate duration, if no events, send tick event
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(CEvent::Key(key)) = event::read() {
                        if tx_event.send(Event::Input(key)).is_err() {
                            break;
                        }
                    }
                },
                Ok(false) => {},
                Err(_) => break,
            }
            if last_tick.elapsed() >= tick_rate {
                if tx_event.send(Event::Tick).is_err() {
                    break;
                }
                last_tick = Instant::now();
            }
        }
    });
    Ok(())
}
