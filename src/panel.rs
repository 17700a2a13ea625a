use crate::data::Neighborhood;
use chrono::{DateTime, Utc};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Placeholder for any attribute the dataset did not provide
const MISSING: &str = "—";

/// Render the detail panel for the selected neighborhood. The panel holds
/// no state of its own; it exists exactly while a selection exists.
pub fn render(frame: &mut Frame, area: Rect, selected: &Neighborhood) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Neighborhood ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines = field_rows(selected);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc closes",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_rows(hood: &Neighborhood) -> Vec<Line<'static>> {
    vec![
        row("Name", text_or_dash(hood.name.as_deref())),
        row("Prior name", text_or_dash(hood.old_name.as_deref())),
        row("NPU", text_or_dash(hood.npu.as_deref())),
        row("Acres", fmt_fixed(hood.acres, 1)),
        row("Sq miles", fmt_fixed(hood.sq_miles, 2)),
        row("Last edited", fmt_date(hood.edited)),
        row("Editor", text_or_dash(hood.editor.as_deref())),
        row("Global ID", text_or_dash(hood.global_id.as_deref())),
        row("Object ID", hood.id.to_string()),
    ]
}

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label:<12}"),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn text_or_dash(value: Option<&str>) -> String {
    value.map_or_else(|| MISSING.to_string(), str::to_string)
}

/// Fixed-precision decimal with thousands separators, em dash when absent
fn fmt_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => group_thousands(&format!("{v:.decimals$}")),
        None => MISSING.to_string(),
    }
}

fn fmt_date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || MISSING.to_string(),
        |d| d.format("%b %-d, %Y").to_string(),
    )
}

fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
