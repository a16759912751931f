use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::catalog::jikan::SEARCH_PAGE_LIMIT;
use crate::state::{SearchState, SortDir, SortKey};

use super::widgets::{
    Theme, format_score, score_color, skeleton_lines, titled_block, truncate,
};

pub fn render_search_view(
    frame: &mut Frame,
    area: Rect,
    input: &str,
    search: &SearchState,
    order: &[usize],
    list_state: &mut ListState,
    sort_key: SortKey,
    sort_dir: SortDir,
    accent: Color,
    theme: Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    render_search_input(frame, chunks[0], input, search.is_loading(), accent, theme);
    render_sort_bar(frame, chunks[1], search, sort_key, sort_dir, theme);
    render_results(frame, chunks[2], search, order, list_state, accent, theme);
}

fn render_search_input(
    frame: &mut Frame,
    area: Rect,
    input: &str,
    is_loading: bool,
    accent: Color,
    theme: Theme,
) {
    let title = if is_loading {
        "Search anime (loading...)"
    } else {
        "Search anime"
    };

    let paragraph = Paragraph::new(input)
        .block(titled_block(title, accent))
        .style(Style::default().fg(theme.fg));

    frame.render_widget(paragraph, area);

    frame.set_cursor_position((area.x + input.chars().count() as u16 + 1, area.y + 1));
}

fn render_sort_bar(
    frame: &mut Frame,
    area: Rect,
    search: &SearchState,
    sort_key: SortKey,
    sort_dir: SortDir,
    theme: Theme,
) {
    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled("^s", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(":Sort "),
        Span::styled(
            format!("[{} {}]", sort_key.as_display(), sort_dir.as_arrow()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(":Page "),
        Span::styled(
            format!("[{} / {}]", search.page, search.total_pages),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            if search.has_next_page() { "  next →" } else { "" },
            Style::default().fg(theme.dim),
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_results(
    frame: &mut Frame,
    area: Rect,
    search: &SearchState,
    order: &[usize],
    list_state: &mut ListState,
    accent: Color,
    theme: Theme,
) {
    if search.is_loading() && search.items.is_empty() {
        let skeleton = Paragraph::new(skeleton_lines(SEARCH_PAGE_LIMIT as usize, theme))
            .block(titled_block("Results", accent));
        frame.render_widget(skeleton, area);
        return;
    }

    if search.items.is_empty() {
        let text = if search.query.is_empty() {
            "Type to search. Empty query browses popular titles."
        } else {
            "No results. Try refining your keywords."
        };
        let empty = Paragraph::new(text)
            .block(titled_block("Results", accent))
            .style(Style::default().fg(theme.dim));
        frame.render_widget(empty, area);
        return;
    }

    let title_width = area.width.saturating_sub(28) as usize;

    let items: Vec<ListItem> = order
        .iter()
        .filter_map(|&idx| search.items.get(idx))
        .map(|anime| {
            let year = anime
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "    ".to_string());
            let episodes = anime
                .episodes
                .map(|e| format!("{:>3} ep", e))
                .unwrap_or_else(|| "  ? ep".to_string());

            let line = Line::from(vec![
                Span::styled(
                    format!("{:>5}", format_score(anime.score)),
                    Style::default()
                        .fg(score_color(anime.score))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" │ "),
                Span::styled(format!("{:>4}", year), Style::default().fg(Color::Cyan)),
                Span::raw(" │ "),
                Span::styled(episodes, Style::default().fg(theme.dim)),
                Span::raw(" │ "),
                Span::styled(
                    truncate(&anime.title, title_width),
                    Style::default().fg(theme.fg),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let title = if search.query.is_empty() {
        "Trending & popular".to_string()
    } else {
        format!("Results for \"{}\"", search.query)
    };

    let list = List::new(items)
        .block(titled_block(&title, accent))
        .highlight_style(
            Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, list_state);
}
