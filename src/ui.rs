use crate::app::{App, DataStatus};
use crate::braille::BrailleCanvas;
use crate::map::MapLayers;
use crate::panel;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render one frame: map, detail panel while a selection exists, status bar
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map (and panel)
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    // Panel space is carved out only while a selection exists; visibility
    // is derived, never stored
    match app.panel().cloned() {
        Some(selected) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(20), Constraint::Length(36)])
                .split(chunks[0]);
            render_map(frame, app, columns[0]);
            panel::render(frame, columns[1], &selected);
        }
        None => render_map(frame, app, chunks[0]),
    }

    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Neighborhoods ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.set_map_inner(inner);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .renderer
        .render(inner.width as usize, inner.height as usize, &viewport, &app.flags);

    let map_widget = MapWidget {
        layers,
        cursor: app.cursor_cell(),
        hovering: app.hovering(),
    };
    frame.render_widget(map_widget, inner);
}

/// Blits the Braille layers into the buffer, back to front, then the
/// cursor marker on top
struct MapWidget {
    layers: MapLayers,
    cursor: Option<(u16, u16)>,
    hovering: bool,
}

impl MapWidget {
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_layer(&self.layers.outlines, Color::Cyan, area, buf);
        self.render_layer(&self.layers.selected, Color::Magenta, area, buf);
        self.render_layer(&self.layers.hovered, Color::Yellow, area, buf);

        // Cursor marker; brightens over a feature as the interactivity cue
        if let Some((cx, cy)) = self.cursor {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                let style = if self.hovering {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Red)
                };
                buf[(x, y)].set_char('╋').set_style(style);
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let data_span = match app.data_status {
        DataStatus::Loading => {
            Span::styled("loading boundaries…", Style::default().fg(Color::Yellow))
        }
        DataStatus::Failed => Span::styled(
            "no data (see hood-map.log)",
            Style::default().fg(Color::Red),
        ),
        DataStatus::Ready => Span::styled(
            format!("{} neighborhoods", app.renderer.feature_count()),
            Style::default().fg(Color::Green),
        ),
    };

    let mut spans = vec![Span::raw(" "), data_span];

    if let Some(name) = app.hovered_name() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            name.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    spans.extend([
        Span::styled(" | Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{:.1}x", app.viewport.zoom),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(center_coords(app), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom r:fit click:select q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn center_coords(app: &App) -> String {
    let viewport = &app.viewport;
    format!(
        "{:.2}°{}, {:.2}°{}",
        viewport.center_lat.abs(),
        if viewport.center_lat >= 0.0 { "N" } else { "S" },
        viewport.center_lon.abs(),
        if viewport.center_lon >= 0.0 { "E" } else { "W" }
    )
}
