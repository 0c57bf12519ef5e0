use anyhow::{Context, Result};
use git_version::git_version;
use spiketools::link;
use spikeview::{
    app::{App, Event},
    control::Controller,
    poll::{self, Poller},
    stop_channel, terminal, timer, ui, CliArgs, Shared,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

const GIT_VERSION: &str = git_version!(fallback = "unknown");

/// Threads:
/// - poll: reads the board every `poll_period` and pushes into the shared view
/// - timer: forwards key presses and ticks to the UI loop
/// - main: draws, and runs prompt commands which write to the board
fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), GIT_VERSION);
        return Ok(());
    }

    let cfg = args.monitor()?;

    // The terminal belongs to the UI, so logs only go to a file
    if let Some(path) = &args.log {
        let file = std::fs::File::create(path)
            .with_context(|| format!("could not create log file {}", path))?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_max_level(Level::DEBUG)
            .init();
    }
    info!(version = GIT_VERSION, port = %cfg.port, baud = cfg.baud, "starting");

    let port = link::open_monitor(&cfg)?;
    let reader = port.try_clone().context("could not clone serial port")?;

    let shared = Arc::new(Shared::new(cfg.on_screen));
    let (stop, stopped) = stop_channel();
    let (sink, rx_frame) = poll::latest();

    let poller = Poller::new(reader, sink, shared.clone(), &cfg);
    let poll_thread = poll::spawn(poller, stopped, cfg.poll_period);

    let controller = Controller::new(port, shared, stop, &cfg);

    let (tx_event, rx_event) = flume::unbounded();
    timer::main(tx_event, Duration::from_millis(args.tick_rate))?;

    let mut terminal = terminal::setup()?;
    let mut app = App::new("Spike Monitor", args.enhanced_graphics, controller, rx_frame);

    // Main loop - blocks on receiving events for input and ticks
    let res = (|| -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, &app))?;
            match rx_event.recv()? {
                Event::Input(key) => app.on_key(key)?,
                Event::Tick => app.on_tick(),
            }
            if app.should_quit {
                return Ok(());
            }
        }
    })();

    terminal::restore(&mut terminal)?;
    // Dropping the controller drops the stop handle, which ends the poll loop
    drop(app);
    if poll_thread.join().is_err() {
        tracing::warn!("poll thread panicked");
    }
    info!("stopped");
    res
}
