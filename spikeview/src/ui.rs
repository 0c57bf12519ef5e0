use crate::app::App;
use std::io::Write;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

const PROMPT: &str = "cmd?: ";
/// Event times are raw board timer counts, not seconds
const TIME_AXIS: &str = "Time [ticks]";

pub fn draw<B: Backend, W: Write>(f: &mut Frame<B>, app: &App<W>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(1),
                Constraint::Length(3),
            ].as_ref()
        )
        .split(f.size());
    draw_titlebar(f, app, chunks[0]);
    draw_spikes(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_prompt(f, app, chunks[3]);
}

fn draw_titlebar<B: Backend, W: Write>(f: &mut Frame<B>, app: &App<W>, area: Rect) {
    let text = vec![
        Spans::from(vec![
            Span::styled(
                format!(" {} ", app.title),
                Style::default()
                    .fg(if app.is_streaming() {Color::Green} else {Color::Yellow})
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            ),
            Span::raw(" "),
            Span::styled(
                if app.is_streaming() {"streaming"} else {"paused"},
                Style::default().add_modifier(Modifier::BOLD | Modifier::DIM),
            ),
            Span::raw("   "),
            Span::styled("Rate:", Style::default().add_modifier(Modifier::UNDERLINED)),
            Span::raw(" "),
            Span::styled(numfmt(app.event_rate, 3), Style::default()),
            Span::styled("ev/s", Style::default()),
            Span::raw("   "),
            Span::styled("Shown:", Style::default().add_modifier(Modifier::UNDERLINED)),
            Span::raw(" "),
            Span::styled(format!("{}", app.capacity()), Style::default()),
        ])
    ];
    f.render_widget(Paragraph::new(text), area);
}

fn draw_spikes<B: Backend, W: Write>(f: &mut Frame<B>, app: &App<W>, area: Rect) {
    let points = app.frame.times.iter()
        .zip(app.frame.addresses.iter())
        .map(|(&t, &a)| (t as f64, a as f64))
        .collect::<Vec<(f64, f64)>>();
    let [lo, hi] = time_bounds(&app.frame.times);

    let datasets = vec![
        Dataset::default()
            .marker(if app.enhanced_graphics {symbols::Marker::Braille} else {symbols::Marker::Dot})
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    "Neuron spikes vs. time",
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title(TIME_AXIS)
                .style(Style::default().fg(Color::Gray))
                .bounds([lo, hi])
                .labels(vec![
                    Span::raw(format!("{}", lo)),
                    Span::raw(format!("{}", hi)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Neuron Id")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, 255.0])
                .labels(vec![Span::raw("0"), Span::raw("128"), Span::raw("255")]),
        );
    f.render_widget(chart, area);
}

fn draw_status<B: Backend, W: Write>(f: &mut Frame<B>, app: &App<W>, area: Rect) {
    let text = match &app.reply {
        Some(r) => Span::styled(
            r.text.as_str(),
            Style::default().fg(if r.ok {Color::Green} else {Color::Red}),
        ),
        None => Span::styled(
            "go | pause | show <n> | clear | stop",
            Style::default().add_modifier(Modifier::DIM),
        ),
    };
    f.render_widget(Paragraph::new(Spans::from(vec![text])), area);
}

fn draw_prompt<B: Backend, W: Write>(f: &mut Frame<B>, app: &App<W>, area: Rect) {
    let text = Spans::from(vec![
        Span::styled(PROMPT, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(app.input.as_str()),
    ]);
    f.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::ALL)),
        area,
    );
    let x = area.x + 1 + (PROMPT.len() + app.input.chars().count()) as u16;
    f.set_cursor(x.min(area.right().saturating_sub(2)), area.y + 1);
}

/// X axis range over the shown times, never empty
pub fn time_bounds(times: &[u16]) -> [f64; 2] {
    let lo = times.iter().min().copied().unwrap_or(0);
    let hi = times.iter().max().copied().unwrap_or(0);
    if hi > lo {
        [lo as f64, hi as f64]
    } else {
        [lo as f64, lo as f64 + 1.0]
    }
}

/// Human-readable string encoding size in p, n, µ, m, _, k, M, G, T.
pub fn numfmt(num: f64, dec: usize) -> String {
    match num.is_normal() {
        false => return format!("{:>7.*}", dec, num),
        true  => {
            let sgn = num.signum();
            let num = num.abs();
            let oom = num.log10().floor() as i32;
            let pfx = oom / 3 * 3;
            let value = num / 10f64.powi(pfx);
            let unit = match pfx {
                -12 => Some("p"),
                -9  => Some("n"),
                -6  => Some("µ"),
                -3  => Some("m"),
                3   => Some("k"),
                6   => Some("M"),
                9   => Some("G"),
                12  => Some("T"),
                _   => None,
            };
            let repr = match unit {
                Some(p) => format!("{:>7.*} {}", dec, sgn * value, p),
                None => format!("{:>7.*}", dec, sgn * num),
            };
            return repr;
        },
    }
}
