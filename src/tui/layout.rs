//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph};

use super::runtime::App;
use super::style;
use crate::sim::StepReport;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(10),   // chart
            Constraint::Length(3), // battery gauge
            Constraint::Length(6), // status panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_chart(frame, app, chunks[1]);
    render_battery_gauge(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);
}

/// Header bar: preset, hour progress, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.is_finished() {
        ("■", "DONE")
    } else if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };

    let header = Line::from(vec![
        Span::styled(
            " SOLAR-SWARM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            &app.preset_name,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ {} agents │ {} │ h={}/{} │ {}ms │ {} {} ",
            app.agent_count(),
            app.policy_name(),
            app.hour,
            app.total_hours,
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn series(app: &App, value: impl Fn(&StepReport) -> f32) -> Vec<(f64, f64)> {
    app.history
        .iter()
        .map(|r| (r.hour as f64, f64::from(value(r))))
        .collect()
}

/// Solar used, grid import and shared energy per hour.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let solar = series(app, |r| r.total_solar_used);
    let grid = series(app, |r| r.total_grid_import);
    let shared = series(app, |r| r.total_shared);

    let y_bounds = style::auto_bounds_y(&[&solar, &grid, &shared]);
    let x_lo = solar.first().map_or(0.0, |p| p.0);
    let x_hi = solar.last().map_or(1.0, |p| p.0).max(x_lo + 1.0);

    let datasets = vec![
        Dataset::default()
            .name("Solar used")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::SOLAR_COLOR))
            .data(&solar),
        Dataset::default()
            .name("Grid import")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::GRID_COLOR))
            .data(&grid),
        Dataset::default()
            .name("Shared")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(style::SHARED_COLOR))
            .data(&shared),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(" Solar vs Grid (kWh per hour) ")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("hour")
                .bounds([x_lo, x_hi])
                .labels(vec![format!("{}", x_lo as u32), format!("{}", x_hi as u32)]),
        )
        .y_axis(
            Axis::default()
                .title("kWh")
                .bounds(y_bounds)
                .labels(vec![
                    format!("{:.1}", y_bounds[0]),
                    format!("{:.1}", y_bounds[1]),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Mean battery gauge with a peer-sharing indicator.
fn render_battery_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let fraction = app.avg_battery();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(16)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().title(" Avg battery ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(style::battery_color(fraction)))
        .ratio(f64::from(fraction).clamp(0.0, 1.0))
        .label(format!("{:.0}%", fraction * 100.0));
    frame.render_widget(gauge, chunks[0]);

    let flows = app.last_report().map_or(0, |r| r.energy_flows.len());
    let (label, color) = if flows > 0 {
        (format!("SHARING ×{flows}"), style::SHARING_ACTIVE)
    } else {
        (String::new(), style::FOOTER_FG)
    };
    let indicator = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(indicator, chunks[1]);
}

/// Latest tick totals and decision counts.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines = if let Some(r) = app.last_report() {
        let decisions = r
            .decision_stats
            .iter()
            .map(|(action, n)| format!("{action}={n}"))
            .collect::<Vec<_>>()
            .join("  ");
        vec![
            Line::from(format!(
                "  prod={:>6.2}  cons={:>6.2}  solar={:>6.2}  grid={:>6.2}  shared={:>5.2}",
                r.total_production,
                r.total_consumption,
                r.total_solar_used,
                r.total_grid_import,
                r.total_shared,
            )),
            Line::from(format!(
                "  solar use={:>5.1}%  savings=${:.2}  CO2 saved={:.2} kg  links={}",
                r.solar_usage_pct, r.cost_savings, r.co2_saved, r.network_connections,
            )),
            Line::from(format!("  {decisions}")),
            Line::from(format!(
                "  shared in view={:.2} kWh  efficiency={:.0}%",
                app.shared_in_history(),
                r.decision_efficiency,
            )),
        ]
    } else {
        vec![Line::from("  Waiting for first hour...")]
    };

    let block = Block::default().title(" Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints, or the last error.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let text = app.notice.as_deref().map_or_else(
        || " q:Quit  Space:Pause  +/-:Speed  1-5:Preset  r:Restart".to_string(),
        |e| format!(" error: {e}"),
    );
    let footer = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
