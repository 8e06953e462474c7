use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::clock::Clock;
use crate::notes::is_sharp;
use crate::pattern::STEPS;
use crate::ticker::TickSource;
use crate::tone::ToneSource;

// ── Top-level routing ─────────────────────────────────────────────────────────

pub fn draw<C: Clock, T: TickSource, S: ToneSource>(f: &mut Frame, app: &App<C, T, S>) {
    let area = f.area();
    let rows = app.grid_rows();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                      // title bar  chunks[0]
            Constraint::Length(6),                      // controls   chunks[1]
            Constraint::Length(rows.len() as u16 + 3),  // grid       chunks[2]
            Constraint::Length(3),                      // status     chunks[3]
            Constraint::Min(0),                         // help       chunks[4]
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(chunks[1]);

    draw_title(f, chunks[0], app);
    draw_controls(f, top[0], app);
    draw_selector(f, top[1], app);
    draw_grid(f, chunks[2], app, &rows);
    draw_status(f, chunks[3], app);
    draw_help(f, chunks[4]);
}

// ── Title bar ─────────────────────────────────────────────────────────────────

fn draw_title<C: Clock, T: TickSource, S: ToneSource>(f: &mut Frame, area: Rect, app: &App<C, T, S>) {
    let (state, color) =
        if app.is_playing() { ("▶ PLAYING", Color::Green) } else { ("■ STOPPED", Color::Yellow) };
    let text = format!("  Bassline  ─  {}  ─  Space: play/stop  ←→: pattern  ↑↓: BPM  w: wave", state);
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

// ── Controls ──────────────────────────────────────────────────────────────────

fn draw_controls<C: Clock, T: TickSource, S: ToneSource>(f: &mut Frame, area: Rect, app: &App<C, T, S>) {
    let d = Style::default().fg(Color::DarkGray);
    let pattern = app.pattern();
    let step = app.current_step();
    let step_str = if step < 0 { "--".to_string() } else { format!("{:>2}", step + 1) };

    let lines = vec![
        Line::from(vec![
            Span::styled("BPM: ", d),
            Span::styled(format!("{:.0}", app.tempo().bpm()),
                         Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled("Wave: ", d),
            Span::styled(app.waveform().name(),
                         Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled("Step: ", d),
            Span::styled(step_str, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(format!("/{}", STEPS), d),
        ]),
        Line::from(vec![
            Span::styled("Pattern: ", d),
            Span::styled(pattern.name, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  ({}/{})  ", app.pattern_index() + 1, app.catalog.len()), d),
            Span::styled(pattern.category, Style::default().fg(Color::Yellow)),
        ]),
        Line::from(Span::styled(pattern.description, Style::default().fg(Color::Gray))),
        Line::from(vec![
            Span::styled("Notes: ", d),
            Span::styled(pattern.pattern_string(), Style::default().fg(Color::Cyan)),
        ]),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().title(" Pattern ").borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        area,
    );
}

// ── Pattern selector ──────────────────────────────────────────────────────────

fn draw_selector<C: Clock, T: TickSource, S: ToneSource>(f: &mut Frame, area: Rect, app: &App<C, T, S>) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app.pattern_window(visible).into_iter()
        .map(|(i, entry)| {
            if i == app.pattern_index() {
                Line::from(vec![
                    Span::styled("▶ ", Style::default().fg(Color::Green)),
                    Span::styled(entry.name, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                ])
            } else {
                Line::from(vec![
                    Span::raw("  "),
                    Span::styled(entry.name, Style::default().fg(Color::Gray)),
                    Span::styled(format!("  {}", entry.category), Style::default().fg(Color::DarkGray)),
                ])
            }
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Patterns ").borders(Borders::ALL)),
        area,
    );
}

// ── Pattern grid ──────────────────────────────────────────────────────────────

fn draw_grid<C: Clock, T: TickSource, S: ToneSource>(
    f: &mut Frame, area: Rect, app: &App<C, T, S>, rows: &[String],
) {
    let pattern = app.pattern();
    let playhead = usize::try_from(app.current_step()).ok();
    let mut lines: Vec<Line> = Vec::new();

    {
        let mut s = vec![Span::raw("      ")];
        for i in 0..STEPS {
            if i > 0 && i % 4 == 0 { s.push(Span::raw(" ")); }
            let label = if i % 4 == 0 { format!("{:<3}", i + 1) } else { " · ".to_string() };
            let sty = if playhead == Some(i) { Style::default().fg(Color::Green).add_modifier(Modifier::BOLD) }
                      else                   { Style::default().fg(Color::DarkGray) };
            s.push(Span::styled(label, sty));
        }
        lines.push(Line::from(s));
    }

    for note in rows {
        let used = pattern.uses_note(note);
        let label_sty = if used            { Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD) }
                        else if is_sharp(note) { Style::default().fg(Color::DarkGray) }
                        else               { Style::default().fg(Color::Gray) };
        let mut s = vec![Span::styled(format!(" {:<4} ", note), label_sty)];

        for i in 0..STEPS {
            if i > 0 && i % 4 == 0 { s.push(Span::styled("│", Style::default().fg(Color::DarkGray))); }
            let on    = pattern.is_active(note, i);
            let is_ph = playhead == Some(i);
            let (cell, sty) = match (on, is_ph) {
                (true,  true)  => ("███", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                (true,  false) => ("███", Style::default().fg(Color::Cyan)),
                (false, true)  => (" · ", Style::default().fg(Color::Black).bg(Color::DarkGray)),
                (false, false) => (" · ", Style::default().fg(Color::DarkGray)),
            };
            s.push(Span::styled(cell, sty));
        }
        lines.push(Line::from(s));
    }

    let title = if app.hide_unused { " Grid  [h] show all " } else { " Grid  [h] hide unused " };
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default().title(title).borders(Borders::ALL)
                .border_style(if app.is_playing() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                }),
        ),
        area,
    );
}

// ── Status ────────────────────────────────────────────────────────────────────

fn draw_status<C: Clock, T: TickSource, S: ToneSource>(f: &mut Frame, area: Rect, app: &App<C, T, S>) {
    let msg = if app.status_msg.is_empty() { "Ready" } else { app.status_msg.as_str() };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(Color::Yellow))))
            .block(Block::default().title(" Status ").borders(Borders::ALL)),
        area,
    );
}

// ── Help ──────────────────────────────────────────────────────────────────────

fn draw_help(f: &mut Frame, area: Rect) {
    let w = Style::default().fg(Color::White);

    let transport = Line::from(vec![
        Span::styled("[Space/Enter] ", w), Span::raw("Play/Stop  │  "),
        Span::styled("[Bksp] ",        w), Span::raw("Rewind  │  "),
        Span::styled("[←→] ",          w), Span::raw("Pattern  │  "),
        Span::styled("[Home] ",        w), Span::raw("Default  │  "),
        Span::styled("[↑↓] ",          w), Span::raw("BPM ±1  │  "),
        Span::styled("[PgUp/Dn] ",     w), Span::raw("BPM ±5"),
    ]);
    let other = Line::from(vec![
        Span::styled("[w] ",       w), Span::raw("Waveform  │  "),
        Span::styled("[h] ",       w), Span::raw("Hide unused  │  "),
        Span::styled("[m] ",       w), Span::raw("Export MIDI  │  "),
        Span::styled("[Esc/q] ",   w), Span::raw("Quit"),
    ]);

    f.render_widget(
        Paragraph::new(vec![transport, other])
            .block(Block::default().title(" Help ").borders(Borders::ALL))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
