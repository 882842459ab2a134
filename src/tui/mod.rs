//! Ratatui-based terminal dashboard.
//!
//! The dashboard is a read-only consumer of the persisted dataset: it loads
//! the CSV store, offers a series picker and an inclusive year-range filter,
//! and renders the selected series as a monthly line chart with the latest
//! month's headline metrics on top. It never mutates the store; `r` re-reads
//! it from disk after an external `bls update`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Datelike;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::cli::DashArgs;
use crate::dataset;
use crate::domain::{Observation, Registry};
use crate::error::AppError;
use crate::io::store;
use crate::report;

mod plotters_chart;

use plotters_chart::SeriesChart;

/// Headline metrics shown in the header, in display order.
const HEADLINE_KEYS: [&str; 3] = [
    "nonfarm_employment",
    "unemployment_rate",
    "labor_force_participation",
];

/// Start the dashboard.
pub fn run(args: DashArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args.data);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    registry: Registry,
    data_path: PathBuf,
    rows: Vec<Observation>,
    /// Min/max year present in the dataset, when non-empty.
    data_years: Option<(i32, i32)>,
    series_idx: usize,
    from_year: i32,
    to_year: i32,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(data_path: PathBuf) -> Self {
        let mut app = Self {
            registry: Registry::bls(),
            data_path,
            rows: Vec::new(),
            data_years: None,
            series_idx: 0,
            from_year: 0,
            to_year: 0,
            selected_field: 0,
            status: String::new(),
        };
        app.reload();
        app
    }

    /// Re-read the store. A missing or unreadable file degrades to an empty
    /// dashboard with a status message, never a crash.
    fn reload(&mut self) {
        self.rows = if self.data_path.exists() {
            match store::load(&self.data_path) {
                Ok(rows) => {
                    self.status =
                        format!("Loaded {} rows from {}", rows.len(), self.data_path.display());
                    rows
                }
                Err(err) => {
                    self.status = format!("{err} (showing empty state)");
                    Vec::new()
                }
            }
        } else {
            self.status = format!(
                "No dataset at {}. Run `bls update` first.",
                self.data_path.display()
            );
            Vec::new()
        };

        self.data_years = dataset::year_bounds(&self.rows);
        if let Some((lo, hi)) = self.data_years {
            self.from_year = lo;
            self.to_year = hi;
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 2 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                let n = self.registry.len() as i32;
                if n > 0 {
                    self.series_idx = (self.series_idx as i32 + delta).rem_euclid(n) as usize;
                    self.status = format!("series: {}", self.selected_series().label);
                }
            }
            1 => {
                if let Some((lo, _)) = self.data_years {
                    self.from_year = (self.from_year + delta).clamp(lo, self.to_year);
                    self.status = format!("from: {}", self.from_year);
                }
            }
            2 => {
                if let Some((_, hi)) = self.data_years {
                    self.to_year = (self.to_year + delta).clamp(self.from_year, hi);
                    self.status = format!("to: {}", self.to_year);
                }
            }
            _ => {}
        }
    }

    fn selected_series(&self) -> crate::domain::SeriesDef {
        self.registry.entries()[self.series_idx]
    }

    /// Observations for the selected series within the year filter, as
    /// `(fractional year, value)` chart points.
    fn chart_points(&self) -> Vec<(f64, f64)> {
        let filtered = dataset::filter_years(&self.rows, self.from_year, self.to_year);
        dataset::series_points(&filtered, self.selected_series().key)
            .into_iter()
            .map(|(d, v)| (fractional_year(d), v))
            .collect()
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("bls", Style::default().fg(Color::Cyan)),
            Span::raw(" — U.S. Labor Statistics Dashboard"),
        ]));

        let last = dataset::latest_date(&self.rows);
        let last_label = last
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(
            format!(
                "series: {} | years: {}-{} | last updated: {last_label} | rows: {}",
                self.selected_series().label,
                self.from_year,
                self.to_year,
                self.rows.len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(last) = last {
            let metrics: Vec<String> = HEADLINE_KEYS
                .iter()
                .map(|&key| {
                    let value = dataset::value_at(&self.rows, key, last)
                        .map(|v| report::fmt_value(key, v))
                        .unwrap_or_else(|| "-".to_string());
                    format!("{}: {value}", self.registry.label(key))
                })
                .collect();
            lines.push(Line::from(Span::styled(
                metrics.join(" | "),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(7)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let series = self.selected_series();
        let block = Block::default()
            .title(series.label)
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let line = self.chart_points();
        if line.is_empty() {
            // Explicit no-data indicator instead of an empty chart.
            let msg = Paragraph::new(format!(
                "No data for {} in {}-{}.",
                series.label, self.from_year, self.to_year
            ))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        }

        let (x_bounds, y_bounds) = chart_bounds(&line, self.from_year, self.to_year);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SeriesChart {
            line: &line,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: series.label.to_string(),
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Series: {}", self.selected_series().label)),
            ListItem::new(format!("From:   {}", self.from_year)),
            ListItem::new(format!("To:     {}", self.to_year)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Calendar date -> fractional year for the x axis (month resolution).
fn fractional_year(date: chrono::NaiveDate) -> f64 {
    date.year() as f64 + (date.month0() as f64) / 12.0
}

fn chart_bounds(line: &[(f64, f64)], from_year: i32, to_year: i32) -> ([f64; 2], [f64; 2]) {
    let x_bounds = [from_year as f64, to_year as f64 + 1.0];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in line {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        // Flat or degenerate series still gets a visible band.
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    (x_bounds, [y_min - pad, y_max + pad])
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_year(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_value(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fractional_year_is_month_resolution() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jul = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert!((fractional_year(jan) - 2024.0).abs() < 1e-12);
        assert!((fractional_year(jul) - 2024.5).abs() < 1e-12);
    }

    #[test]
    fn chart_bounds_pad_flat_series() {
        let line = vec![(2024.0, 3.7), (2024.25, 3.7)];
        let (x, y) = chart_bounds(&line, 2024, 2024);
        assert_eq!(x, [2024.0, 2025.0]);
        assert!(y[0] < 3.7 && y[1] > 3.7);
    }
}
