use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Foreground/background palette for the light/dark toggle. The accent
/// color stays user-configured on top of either palette.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub fg: Color,
    pub dim: Color,
    pub bg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            fg: Color::White,
            dim: Color::DarkGray,
            bg: Color::Black,
        }
    }

    pub fn light() -> Self {
        Self {
            fg: Color::Black,
            dim: Color::Gray,
            bg: Color::White,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }
}

/// Create a styled block with a title
pub fn titled_block(title: &str, accent: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(format!(" {} ", title))
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
}

/// Create a help bar at the bottom
pub fn help_bar<'a>(hints: &'a [(&'a str, &'a str)], theme: Theme) -> Paragraph<'a> {
    let spans: Vec<Span> = hints
        .iter()
        .enumerate()
        .flat_map(|(i, (key, action))| {
            let mut v = vec![
                Span::styled(*key, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(*action, Style::default().fg(theme.dim)),
            ];
            if i < hints.len() - 1 {
                v.push(Span::raw("  "));
            }
            v
        })
        .collect();

    Paragraph::new(Line::from(spans))
}

/// Parse accent color from config string
pub fn parse_accent_color(color: &str) -> Color {
    match color.to_lowercase().as_str() {
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        _ => Color::Magenta, // default
    }
}

/// Placeholder rows shown while a section loads.
pub fn skeleton_lines(count: usize, theme: Theme) -> Vec<Line<'static>> {
    (0..count)
        .map(|i| {
            let width = if i % 3 == 0 { 32 } else { 24 };
            Line::styled("▒".repeat(width), Style::default().fg(theme.dim))
        })
        .collect()
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:.2}", s),
        None => "—".to_string(),
    }
}

pub fn score_color(score: Option<f64>) -> Color {
    match score {
        Some(s) if s >= 8.0 => Color::Green,
        Some(s) if s >= 6.5 => Color::Yellow,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    }
}

/// Char-boundary-safe truncation with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }
    let cut: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", cut.trim_end())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

/// Transient one-line notice in the bottom-right corner.
pub fn render_toast(frame: &mut Frame, text: &str, level: ToastLevel, theme: Theme) {
    let area = frame.area();
    let width = (text.chars().count() as u16 + 4).min(area.width);
    let toast_area = Rect {
        x: area.width.saturating_sub(width),
        y: area.height.saturating_sub(4),
        width,
        height: 3,
    };

    let border = match level {
        ToastLevel::Info => theme.dim,
        ToastLevel::Error => Color::Red,
    };

    frame.render_widget(Clear, toast_area);
    let para = Paragraph::new(truncate(text, width.saturating_sub(4) as usize)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(para, toast_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("Naruto", 10), "Naruto");
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        assert_eq!(truncate("進撃の巨人 Attack on Titan", 6), "進撃の巨人…");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(8.5)), "8.50");
        assert_eq!(format_score(None), "—");
    }
}
