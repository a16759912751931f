use chrono::DateTime;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use ratatui_image::{StatefulImage, protocol::StatefulProtocol};

use crate::catalog::{Anime, clean_synopsis};
use crate::state::DetailState;
use crate::state::detail::{CHARACTERS_PAGE_SIZE, Pager, REVIEWS_PAGE_SIZE};
use crate::ui::widgets::{
    Theme, format_score, skeleton_lines, titled_block, truncate,
};

const REVIEW_PREVIEW_CHARS: usize = 260;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Overview,
    Characters,
    Reviews,
    Streaming,
    Trailer,
    Recommendations,
}

impl DetailTab {
    pub fn as_display(&self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Characters => "Characters",
            DetailTab::Reviews => "Reviews",
            DetailTab::Streaming => "Streaming",
            DetailTab::Trailer => "Trailer",
            DetailTab::Recommendations => "Recommendations",
        }
    }
}

/// Tabs currently worth showing: a section appears while loading,
/// after a failure (so the failed state stays visible), or when it
/// succeeded with data. The trailer tab tracks the primary record.
pub fn visible_tabs(detail: &DetailState) -> Vec<DetailTab> {
    fn section_visible<T>(section: &crate::state::Section<Vec<T>>) -> bool {
        section.is_loading()
            || section.is_failed()
            || section.data.as_ref().is_some_and(|d| !d.is_empty())
    }

    let mut tabs = vec![DetailTab::Overview];
    if section_visible(&detail.characters) {
        tabs.push(DetailTab::Characters);
    }
    if section_visible(&detail.reviews) {
        tabs.push(DetailTab::Reviews);
    }
    if section_visible(&detail.streaming) {
        tabs.push(DetailTab::Streaming);
    }
    if detail
        .item
        .data
        .as_ref()
        .is_some_and(|a| a.trailer_url().is_some())
    {
        tabs.push(DetailTab::Trailer);
    }
    if section_visible(&detail.recommendations) {
        tabs.push(DetailTab::Recommendations);
    }
    tabs
}

/// Per-visit presentation state for the detail screen.
pub struct DetailPanes {
    pub tab: DetailTab,
    pub overview_scroll: u16,
    pub reviews_scroll: u16,
    pub characters_state: ListState,
    pub streaming_state: ListState,
    pub recommendations_state: ListState,
    pub char_pager: Pager,
    pub review_pager: Pager,
    pub poster: Option<StatefulProtocol>,
}

impl Default for DetailPanes {
    fn default() -> Self {
        Self {
            tab: DetailTab::Overview,
            overview_scroll: 0,
            reviews_scroll: 0,
            characters_state: ListState::default(),
            streaming_state: ListState::default(),
            recommendations_state: ListState::default(),
            char_pager: Pager::new(CHARACTERS_PAGE_SIZE),
            review_pager: Pager::new(REVIEWS_PAGE_SIZE),
            poster: None,
        }
    }
}

impl DetailPanes {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub fn render_detail_view(
    frame: &mut Frame,
    area: Rect,
    detail: &DetailState,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    if detail.item.is_loading() {
        let skeleton =
            Paragraph::new(skeleton_lines(8, theme)).block(titled_block("Loading", accent));
        frame.render_widget(skeleton, area);
        return;
    }

    if detail.item.is_failed() {
        render_detail_error(
            frame,
            area,
            detail.item.error.as_deref().unwrap_or("Unknown error"),
            theme,
        );
        return;
    }

    let Some(anime) = detail.item.data.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    render_header(frame, chunks[0], anime, accent, theme);

    let tabs = visible_tabs(detail);
    render_tab_bar(frame, chunks[1], &tabs, panes.tab, accent, theme);

    match panes.tab {
        DetailTab::Overview => render_overview(frame, chunks[2], anime, panes, accent, theme),
        DetailTab::Characters => render_characters(frame, chunks[2], detail, panes, accent, theme),
        DetailTab::Reviews => render_reviews(frame, chunks[2], detail, panes, accent, theme),
        DetailTab::Streaming => render_streaming(frame, chunks[2], detail, panes, accent, theme),
        DetailTab::Trailer => render_trailer(frame, chunks[2], anime, accent, theme),
        DetailTab::Recommendations => {
            render_recommendations(frame, chunks[2], detail, panes, accent, theme)
        }
    }
}

/// Full-screen panel for a failed primary load.
pub fn render_detail_error(frame: &mut Frame, area: Rect, error: &str, theme: Theme) {
    let lines = vec![
        Line::styled(
            "Something went wrong",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::styled(error.to_string(), Style::default().fg(theme.fg)),
        Line::raw(""),
        Line::styled("Esc  back to search    r  reload", Style::default().fg(theme.dim)),
    ];

    let panel = Paragraph::new(lines)
        .block(titled_block("Detail", Color::Red))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn render_header(frame: &mut Frame, area: Rect, anime: &Anime, accent: Color, theme: Theme) {
    let mut chips: Vec<Span> = vec![Span::styled(
        format!("★ {}", format_score(anime.score)),
        Style::default().fg(Color::Yellow),
    )];
    if let Some(eps) = anime.episodes {
        chips.push(Span::raw("  ·  "));
        chips.push(Span::styled(
            format!("{} ep", eps),
            Style::default().fg(theme.fg),
        ));
    }
    if let Some(year) = anime.year {
        chips.push(Span::raw("  ·  "));
        chips.push(Span::styled(
            year.to_string(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let mut badges: Vec<Span> = Vec::new();
    for value in [
        anime.kind.as_deref(),
        anime.status.as_deref(),
        anime.duration.as_deref(),
        anime.rating.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        if !badges.is_empty() {
            badges.push(Span::raw("  ·  "));
        }
        badges.push(Span::styled(
            value.to_string(),
            Style::default().fg(theme.dim),
        ));
    }

    let lines = vec![Line::from(chips), Line::from(badges)];
    let header = Paragraph::new(lines).block(titled_block(&anime.title, accent));
    frame.render_widget(header, area);
}

fn render_tab_bar(
    frame: &mut Frame,
    area: Rect,
    tabs: &[DetailTab],
    current: DetailTab,
    accent: Color,
    theme: Theme,
) {
    let titles: Vec<Line> = tabs.iter().map(|t| Line::from(t.as_display())).collect();
    let selected = tabs.iter().position(|t| *t == current).unwrap_or(0);

    let bar = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(theme.dim))
        .highlight_style(
            Style::default()
                .fg(accent)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("│", Style::default().fg(theme.dim)));

    frame.render_widget(bar, area);
}

fn render_overview(
    frame: &mut Frame,
    area: Rect,
    anime: &Anime,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(20)])
        .split(area);

    render_poster(frame, columns[0], panes, accent, theme);

    let mut lines: Vec<Line> = vec![Line::styled(
        "Synopsis",
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    )];

    match anime.synopsis.as_deref() {
        Some(synopsis) => {
            for paragraph in clean_synopsis(synopsis).split("\n\n") {
                lines.push(Line::styled(
                    paragraph.replace('\n', " "),
                    Style::default().fg(theme.fg),
                ));
                lines.push(Line::raw(""));
            }
        }
        None => {
            lines.push(Line::styled(
                "No synopsis available.",
                Style::default().fg(theme.dim),
            ));
            lines.push(Line::raw(""));
        }
    }

    for (label, entries) in [
        ("Genres", &anime.genres),
        ("Themes", &anime.themes),
        ("Studios", &anime.studios),
        ("Producers", &anime.producers),
    ] {
        if entries.is_empty() {
            continue;
        }
        let names: Vec<&str> = entries.iter().map(|n| n.name.as_str()).collect();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}: ", label),
                Style::default()
                    .fg(theme.dim)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(names.join(", "), Style::default().fg(theme.fg)),
        ]));
    }

    let mut stats: Vec<Span> = Vec::new();
    if let Some(rank) = anime.rank {
        stats.push(Span::styled(
            format!("# Rank {}", rank),
            Style::default().fg(theme.fg),
        ));
    }
    if let Some(pop) = anime.popularity {
        if !stats.is_empty() {
            stats.push(Span::raw("  ·  "));
        }
        stats.push(Span::styled(
            format!("Pop {}", pop),
            Style::default().fg(theme.fg),
        ));
    }
    if let Some(favs) = anime.favorites {
        if !stats.is_empty() {
            stats.push(Span::raw("  ·  "));
        }
        stats.push(Span::styled(
            format!("♥ {}", favs),
            Style::default().fg(Color::Red),
        ));
    }
    if !stats.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(stats));
    }

    if let Some(url) = anime.url.as_deref() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(url.to_string(), Style::default().fg(theme.dim)));
    }

    let info = Paragraph::new(lines)
        .block(titled_block("Overview", accent))
        .wrap(Wrap { trim: true })
        .scroll((panes.overview_scroll, 0));
    frame.render_widget(info, columns[1]);
}

fn render_poster(
    frame: &mut Frame,
    area: Rect,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let block = titled_block("Poster", accent);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match panes.poster.as_mut() {
        Some(protocol) => {
            frame.render_stateful_widget(StatefulImage::default(), inner, protocol);
        }
        None => {
            let placeholder =
                Paragraph::new("No Image").style(Style::default().fg(theme.dim));
            frame.render_widget(placeholder, inner);
        }
    }
}

fn render_characters(
    frame: &mut Frame,
    area: Rect,
    detail: &DetailState,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let section = &detail.characters;

    if section.is_loading() {
        let skeleton = Paragraph::new(skeleton_lines(CHARACTERS_PAGE_SIZE, theme))
            .block(titled_block("Characters", accent));
        frame.render_widget(skeleton, area);
        return;
    }
    if section.is_failed() {
        render_section_failed(frame, area, "Characters", section.error.as_deref(), theme);
        return;
    }

    let characters = section.data.as_deref().unwrap_or(&[]);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    render_pager_bar(
        frame,
        chunks[0],
        &panes.char_pager,
        characters.len(),
        theme,
    );

    let title_width = area.width.saturating_sub(24) as usize;
    let items: Vec<ListItem> = panes
        .char_pager
        .slice(characters)
        .iter()
        .map(|edge| {
            let role = edge.role.as_deref().unwrap_or("?");
            let favorites = edge
                .favorites
                .map(|f| format!("♥ {:>6}", f))
                .unwrap_or_else(|| "        ".to_string());

            let line = Line::from(vec![
                Span::styled(format!("{:<10}", role), Style::default().fg(Color::Cyan)),
                Span::raw(" │ "),
                Span::styled(favorites, Style::default().fg(Color::Red)),
                Span::raw(" │ "),
                Span::styled(
                    truncate(&edge.character.name, title_width),
                    Style::default().fg(theme.fg),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(titled_block("Characters", accent))
        .highlight_style(
            Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, chunks[1], &mut panes.characters_state);
}

fn render_reviews(
    frame: &mut Frame,
    area: Rect,
    detail: &DetailState,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let section = &detail.reviews;

    if section.is_loading() {
        let skeleton = Paragraph::new(skeleton_lines(REVIEWS_PAGE_SIZE * 2, theme))
            .block(titled_block("Reviews", accent));
        frame.render_widget(skeleton, area);
        return;
    }
    if section.is_failed() {
        render_section_failed(frame, area, "Reviews", section.error.as_deref(), theme);
        return;
    }

    let reviews = section.data.as_deref().unwrap_or(&[]);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    render_pager_bar(frame, chunks[0], &panes.review_pager, reviews.len(), theme);

    let mut lines: Vec<Line> = Vec::new();
    for review in panes.review_pager.slice(reviews) {
        let who = review
            .user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .unwrap_or("Anonymous");
        let mut header = who.to_string();
        if let Some(score) = review.score {
            header.push_str(&format!(" • {}/10", score));
        }
        if let Some(date) = review.date.as_deref() {
            header.push_str(&format!(" • {}", format_review_date(date)));
        }

        lines.push(Line::styled(
            header,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::styled(
            review_preview(&review.review),
            Style::default().fg(theme.fg),
        ));
        lines.push(Line::raw(""));
    }

    let body = Paragraph::new(lines)
        .block(titled_block("Reviews", accent))
        .wrap(Wrap { trim: true })
        .scroll((panes.reviews_scroll, 0));
    frame.render_widget(body, chunks[1]);
}

fn render_streaming(
    frame: &mut Frame,
    area: Rect,
    detail: &DetailState,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let section = &detail.streaming;

    if section.is_loading() {
        let skeleton =
            Paragraph::new(skeleton_lines(6, theme)).block(titled_block("Streaming", accent));
        frame.render_widget(skeleton, area);
        return;
    }
    if section.is_failed() {
        render_section_failed(frame, area, "Streaming", section.error.as_deref(), theme);
        return;
    }

    let links = section.data.as_deref().unwrap_or(&[]);
    let items: Vec<ListItem> = links
        .iter()
        .map(|link| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<16}", link.name),
                    Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
                ),
                Span::styled(link.url.clone(), Style::default().fg(theme.dim)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(titled_block("Streaming", accent))
        .highlight_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut panes.streaming_state);
}

fn render_trailer(frame: &mut Frame, area: Rect, anime: &Anime, accent: Color, theme: Theme) {
    let lines = match anime.trailer_url() {
        Some(url) => vec![
            Line::styled("Trailer", Style::default().fg(theme.dim)),
            Line::raw(""),
            Line::styled(url.to_string(), Style::default().fg(theme.fg)),
        ],
        None => vec![Line::styled(
            "No trailer available.",
            Style::default().fg(theme.dim),
        )],
    };

    let para = Paragraph::new(lines)
        .block(titled_block("Trailer", accent))
        .wrap(Wrap { trim: true });
    frame.render_widget(para, area);
}

fn render_recommendations(
    frame: &mut Frame,
    area: Rect,
    detail: &DetailState,
    panes: &mut DetailPanes,
    accent: Color,
    theme: Theme,
) {
    let section = &detail.recommendations;

    if section.is_loading() {
        let skeleton = Paragraph::new(skeleton_lines(10, theme))
            .block(titled_block("Recommendations", accent));
        frame.render_widget(skeleton, area);
        return;
    }
    if section.is_failed() {
        render_section_failed(
            frame,
            area,
            "Recommendations",
            section.error.as_deref(),
            theme,
        );
        return;
    }

    let title_width = area.width.saturating_sub(6) as usize;
    let recommendations = section.data.as_deref().unwrap_or(&[]);
    let items: Vec<ListItem> = recommendations
        .iter()
        .filter_map(|rec| rec.entry.as_ref())
        .map(|entry| {
            ListItem::new(Line::styled(
                truncate(&entry.title, title_width),
                Style::default().fg(theme.fg),
            ))
        })
        .collect();

    let list = List::new(items)
        .block(titled_block("Recommendations (Enter to open)", accent))
        .highlight_style(
            Style::default()
                .bg(accent)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut panes.recommendations_state);
}

fn render_section_failed(
    frame: &mut Frame,
    area: Rect,
    what: &str,
    error: Option<&str>,
    theme: Theme,
) {
    let lines = vec![
        Line::styled(
            format!("Failed to load {}.", what.to_lowercase()),
            Style::default().fg(Color::Red),
        ),
        Line::styled(
            error.unwrap_or("Unknown error").to_string(),
            Style::default().fg(theme.dim),
        ),
        Line::raw(""),
        Line::styled("Press r to retry.", Style::default().fg(theme.dim)),
    ];

    let panel = Paragraph::new(lines)
        .block(titled_block(what, Color::Red))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn render_pager_bar(frame: &mut Frame, area: Rect, pager: &Pager, len: usize, theme: Theme) {
    let start = (pager.page - 1) * pager.page_size;
    let shown = if pager.show_all {
        len
    } else {
        len.saturating_sub(start).min(pager.page_size)
    };
    let line = if pager.show_all {
        Line::from(vec![
            Span::styled(
                format!(" Showing all {} ", len),
                Style::default().fg(theme.dim),
            ),
            Span::styled("a", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":pages", Style::default().fg(theme.dim)),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                format!(" Showing {} of {} ", shown, len),
                Style::default().fg(theme.dim),
            ),
            Span::styled(
                format!("· Page {} / {} ", pager.page, pager.total_pages(len)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled("←/→", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":page  ", Style::default().fg(theme.dim)),
            Span::styled("a", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":show all", Style::default().fg(theme.dim)),
        ])
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn review_preview(review: &str) -> String {
    let flat = review.replace(['\r', '\n'], " ");
    truncate(flat.trim(), REVIEW_PREVIEW_CHARS)
}

/// Review timestamps arrive as RFC 3339; fall back to the raw string
/// for anything else.
fn format_review_date(date: &str) -> String {
    DateTime::parse_from_rfc3339(date)
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Images, ImageSet, Trailer};
    use crate::state::RequestStatus;

    #[test]
    fn test_format_review_date() {
        assert_eq!(
            format_review_date("2020-01-15T04:20:00+00:00"),
            "Jan 15, 2020"
        );
        assert_eq!(format_review_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_review_preview_truncates_and_flattens() {
        let long = "word ".repeat(100);
        let preview = review_preview(&long);
        assert!(preview.chars().count() <= REVIEW_PREVIEW_CHARS);
        assert!(preview.ends_with('…'));

        assert_eq!(review_preview("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_visible_tabs_overview_only_when_idle() {
        let detail = DetailState::default();
        assert_eq!(visible_tabs(&detail), vec![DetailTab::Overview]);
    }

    #[test]
    fn test_visible_tabs_failed_section_stays_visible() {
        let mut detail = DetailState::default();
        let req = detail.characters.begin();
        assert!(detail.characters.fail(req, "HTTP 429".into()));
        assert_eq!(detail.characters.status, RequestStatus::Failed);

        let tabs = visible_tabs(&detail);
        assert!(tabs.contains(&DetailTab::Characters));
        assert!(!tabs.contains(&DetailTab::Reviews));
    }

    #[test]
    fn test_visible_tabs_empty_success_hidden() {
        let mut detail = DetailState::default();
        let req = detail.streaming.begin();
        assert!(detail.streaming.succeed(req, Vec::new()));

        assert!(!visible_tabs(&detail).contains(&DetailTab::Streaming));
    }

    #[test]
    fn test_visible_tabs_trailer_follows_item() {
        let mut detail = DetailState::default();
        let req = detail.item.begin();
        let anime = Anime {
            trailer: Some(Trailer {
                embed_url: Some("https://youtube.com/embed/x".into()),
                url: None,
            }),
            images: Images {
                jpg: Some(ImageSet::default()),
            },
            ..Anime::default()
        };
        assert!(detail.item.succeed(req, anime));

        assert!(visible_tabs(&detail).contains(&DetailTab::Trailer));
    }
}
