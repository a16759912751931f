use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, ListState, Paragraph, Row, Table},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::catalog::{
    Anime, CatalogProvider, CharacterEdge, JikanClient, Recommendation, Review, SearchPage,
    StreamingLink,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::image_cache::ImageCache;
use crate::notify::Notifier;
use crate::state::{DetailState, RequestId, SearchState, SortDir, SortKey, sort_order};
use crate::ui::widgets::{self, Theme, ToastLevel};
use crate::ui::{DetailPanes, DetailTab, render_detail_view, render_search_view, visible_tabs};

/// Keystrokes must pause this long before a search is issued.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);
const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Search,
    Detail,
    Help,
}

/// Failure payload carried back from a fetch task.
pub struct FetchFailure {
    pub message: String,
    pub rate_limited: bool,
}

impl From<Error> for FetchFailure {
    fn from(e: Error) -> Self {
        Self {
            rate_limited: e.is_rate_limited(),
            message: e.to_string(),
        }
    }
}

pub enum AppMessage {
    SearchLoaded(RequestId, Box<SearchPage>),
    SearchFailed(RequestId, FetchFailure),
    DetailLoaded(RequestId, Box<Anime>),
    DetailFailed(RequestId, FetchFailure),
    CharactersLoaded(RequestId, Vec<CharacterEdge>),
    CharactersFailed(RequestId, FetchFailure),
    ReviewsLoaded(RequestId, Vec<Review>),
    ReviewsFailed(RequestId, FetchFailure),
    StreamingLoaded(RequestId, Vec<StreamingLink>),
    StreamingFailed(RequestId, FetchFailure),
    RecommendationsLoaded(RequestId, Vec<Recommendation>),
    RecommendationsFailed(RequestId, FetchFailure),
    PosterFetched(u64),
}

struct Toast {
    text: String,
    level: ToastLevel,
    until: Instant,
}

pub struct App {
    pub config: Config,
    pub running: bool,
    pub view: View,
    pub previous_view: View,
    pub accent: Color,
    pub theme: Theme,

    // search screen
    pub input: String,
    pub search: SearchState,
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub sorted: Vec<usize>,
    pub results_state: ListState,
    debounce_deadline: Option<Instant>,
    search_task: Option<JoinHandle<()>>,

    // detail screen
    pub detail: DetailState,
    pub detail_id: Option<u64>,
    pub panes: DetailPanes,
    detail_history: Vec<u64>,
    detail_tasks: Vec<JoinHandle<()>>,

    toast: Option<Toast>,

    msg_tx: mpsc::UnboundedSender<AppMessage>,
    msg_rx: mpsc::UnboundedReceiver<AppMessage>,

    provider: Arc<dyn CatalogProvider + Send + Sync>,
    image_cache: Arc<ImageCache>,
    picker: Option<ratatui_image::picker::Picker>,
    notifier: Notifier,
}

impl App {
    pub fn new(config: Config, picker: Option<ratatui_image::picker::Picker>) -> Result<Self> {
        let accent = widgets::parse_accent_color(&config.ui.accent_color);
        let theme = Theme::from_name(&config.ui.theme);

        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        let provider: Arc<dyn CatalogProvider + Send + Sync> =
            Arc::new(JikanClient::with_base_url(&config.api.base_url));
        let image_cache = Arc::new(ImageCache::new()?);
        let notifier = Notifier::new(config.general.notifications);

        Ok(Self {
            config,
            running: true,
            view: View::Search,
            previous_view: View::Search,
            accent,
            theme,

            input: String::new(),
            search: SearchState::new(),
            sort_key: SortKey::default(),
            sort_dir: SortDir::default(),
            sorted: Vec::new(),
            results_state: ListState::default(),
            debounce_deadline: None,
            search_task: None,

            detail: DetailState::default(),
            detail_id: None,
            panes: DetailPanes::default(),
            detail_history: Vec::new(),
            detail_tasks: Vec::new(),

            toast: None,

            msg_tx,
            msg_rx,

            provider,
            image_cache,
            picker,
            notifier,
        })
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        // initial browse (empty query, page 1) happens once, undebounced
        self.dispatch_search();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events().await?;
            self.tick();
            self.process_messages();
        }

        self.abort_detail_tasks();
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        Ok(())
    }

    fn tick(&mut self) {
        if let Some(deadline) = self.debounce_deadline {
            if Instant::now() >= deadline {
                self.debounce_deadline = None;
                self.search.set_query(&self.input);
                self.dispatch_search();
            }
        }

        if let Some(toast) = &self.toast {
            if Instant::now() >= toast.until {
                self.toast = None;
            }
        }
    }

    fn process_messages(&mut self) {
        while let Ok(msg) = self.msg_rx.try_recv() {
            match msg {
                AppMessage::SearchLoaded(req, page) => {
                    if self.search.succeed(req, *page) {
                        self.resort();
                        if self.sorted.is_empty() && !self.search.query.is_empty() {
                            self.show_toast(
                                "No results. Try refining your keywords.",
                                ToastLevel::Info,
                            );
                        }
                    }
                }
                AppMessage::SearchFailed(req, failure) => {
                    if self.search.fail(req, failure.message.clone()) {
                        error!(error = %failure.message, "Search failed");
                        if failure.rate_limited {
                            self.show_toast(
                                "Rate limit reached by the API. Wait a bit and retry.",
                                ToastLevel::Error,
                            );
                            self.notifier.rate_limited("search");
                        } else {
                            self.show_toast("Search failed. Please try again.", ToastLevel::Error);
                        }
                    }
                }
                AppMessage::DetailLoaded(req, anime) => {
                    let poster_url = anime.poster_url().map(str::to_string);
                    if self.detail.item.succeed(req, *anime) {
                        if let Some(url) = poster_url {
                            self.fetch_poster(url);
                        }
                    }
                }
                AppMessage::DetailFailed(req, failure) => {
                    if self.detail.item.fail(req, failure.message.clone()) {
                        error!(error = %failure.message, "Detail fetch failed");
                        if failure.rate_limited {
                            self.show_toast(
                                "Rate limit reached. Press r to reload.",
                                ToastLevel::Error,
                            );
                            self.notifier.rate_limited("detail");
                        }
                    }
                }
                AppMessage::CharactersLoaded(req, data) => {
                    self.detail.characters.succeed(req, data);
                }
                AppMessage::CharactersFailed(req, failure) => {
                    if self.detail.characters.fail(req, failure.message.clone()) {
                        self.on_section_failed("characters", &failure);
                    }
                }
                AppMessage::ReviewsLoaded(req, data) => {
                    self.detail.reviews.succeed(req, data);
                }
                AppMessage::ReviewsFailed(req, failure) => {
                    if self.detail.reviews.fail(req, failure.message.clone()) {
                        self.on_section_failed("reviews", &failure);
                    }
                }
                AppMessage::StreamingLoaded(req, data) => {
                    self.detail.streaming.succeed(req, data);
                }
                AppMessage::StreamingFailed(req, failure) => {
                    if self.detail.streaming.fail(req, failure.message.clone()) {
                        self.on_section_failed("streaming", &failure);
                    }
                }
                AppMessage::RecommendationsLoaded(req, data) => {
                    self.detail.recommendations.succeed(req, data);
                }
                AppMessage::RecommendationsFailed(req, failure) => {
                    if self
                        .detail
                        .recommendations
                        .fail(req, failure.message.clone())
                    {
                        self.on_section_failed("recommendations", &failure);
                    }
                }
                AppMessage::PosterFetched(mal_id) => {
                    if self.detail_id == Some(mal_id) {
                        self.load_poster();
                    }
                }
            }
        }
    }

    fn on_section_failed(&mut self, what: &'static str, failure: &FetchFailure) {
        error!(section = what, error = %failure.message, "Section fetch failed");
        if failure.rate_limited {
            self.show_toast(
                &format!("Rate limited loading {}. Press r to retry.", what),
                ToastLevel::Error,
            );
            self.notifier.rate_limited(what);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        frame.render_widget(
            Block::default().style(Style::default().bg(self.theme.bg).fg(self.theme.fg)),
            frame.area(),
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let main_area = chunks[0];
        let help_area = chunks[1];

        match self.view {
            View::Search => {
                self.render_search(frame, main_area);
                let help = widgets::help_bar(
                    &[
                        ("?", "help"),
                        ("Enter", "open"),
                        ("←/→", "page"),
                        ("Esc", "clear"),
                        ("Ctrl-C", "quit"),
                    ],
                    self.theme,
                );
                frame.render_widget(help, help_area);
            }
            View::Detail => {
                render_detail_view(
                    frame,
                    main_area,
                    &self.detail,
                    &mut self.panes,
                    self.accent,
                    self.theme,
                );
                let help = widgets::help_bar(
                    &[
                        ("?", "help"),
                        ("Tab", "next tab"),
                        ("r", "reload"),
                        ("Esc", "back"),
                    ],
                    self.theme,
                );
                frame.render_widget(help, help_area);
            }
            View::Help => {
                match self.previous_view {
                    View::Search => self.render_search(frame, main_area),
                    View::Detail => render_detail_view(
                        frame,
                        main_area,
                        &self.detail,
                        &mut self.panes,
                        self.accent,
                        self.theme,
                    ),
                    View::Help => {}
                }
                self.render_help(frame);
                let help = widgets::help_bar(&[("Esc", "close")], self.theme);
                frame.render_widget(help, help_area);
            }
        }

        if let Some(toast) = &self.toast {
            widgets::render_toast(frame, &toast.text, toast.level, self.theme);
        }
    }

    fn render_search(&mut self, frame: &mut Frame, area: Rect) {
        render_search_view(
            frame,
            area,
            &self.input,
            &self.search,
            &self.sorted,
            &mut self.results_state,
            self.sort_key,
            self.sort_dir,
            self.accent,
            self.theme,
        );
    }

    async fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(());
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    self.running = false;
                    return Ok(());
                }

                match self.view {
                    View::Search => self.handle_search_input(key),
                    View::Detail => self.handle_detail_input(key),
                    View::Help => self.handle_help_input(key.code),
                }
            }
        }
        Ok(())
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.running = false;
            }
            KeyCode::Char('s') if ctrl => {
                self.sort_key = self.sort_key.next();
                self.resort();
            }
            KeyCode::Char('d') if ctrl => {
                self.sort_dir = self.sort_dir.toggle();
                self.resort();
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_theme();
            }
            KeyCode::Esc => {
                if self.input.is_empty() {
                    self.cancel_search();
                } else {
                    self.clear_query();
                }
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.move_selection_down();
            }
            KeyCode::Up => {
                self.move_selection_up();
            }
            KeyCode::Left => {
                self.prev_page();
            }
            KeyCode::Right => {
                self.next_page();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.debounce_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
            }
            KeyCode::Enter => {
                self.open_selected();
            }
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    self.input.push(c);
                    self.debounce_deadline = Some(Instant::now() + SEARCH_DEBOUNCE);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.navigate_back();
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_theme();
            }
            KeyCode::Char('?') => {
                self.toggle_help();
            }
            KeyCode::Tab | KeyCode::Char('l') => {
                self.cycle_tab(true);
            }
            KeyCode::BackTab | KeyCode::Char('h') => {
                self.cycle_tab(false);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.detail_move(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.detail_move(-1);
            }
            KeyCode::Left => {
                self.detail_pager_prev();
            }
            KeyCode::Right => {
                self.detail_pager_next();
            }
            KeyCode::Char('a') => {
                self.detail_toggle_show_all();
            }
            KeyCode::Char('r') => {
                self.reload_failed_sections();
            }
            KeyCode::Enter => {
                if self.panes.tab == DetailTab::Recommendations {
                    self.open_selected_recommendation();
                }
            }
            _ => {}
        }
    }

    fn handle_help_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.toggle_help();
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Search controller
    // ------------------------------------------------------------------

    /// Abort whatever is in flight and issue a fetch for the current
    /// query/page. The aborted task's response could still be racing
    /// through the channel, so commits are additionally guarded by the
    /// request token.
    fn dispatch_search(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }

        let req = self.search.begin();
        let query = self.search.query.clone();
        let page = self.search.page;
        let provider = Arc::clone(&self.provider);
        let tx = self.msg_tx.clone();

        debug!(query = %query, page, "Dispatching search");

        self.search_task = Some(tokio::spawn(async move {
            match provider.search(&query, page).await {
                Ok(result) => {
                    let _ = tx.send(AppMessage::SearchLoaded(req, Box::new(result)));
                }
                Err(e) => {
                    let _ = tx.send(AppMessage::SearchFailed(req, e.into()));
                }
            }
        }));
    }

    /// Clearing the input re-issues the empty browse query immediately,
    /// skipping the debounce.
    fn clear_query(&mut self) {
        self.input.clear();
        self.debounce_deadline = None;
        self.search.set_query("");
        self.dispatch_search();
    }

    /// Esc with an empty input cancels the in-flight search instead of
    /// re-issuing it; the state returns to its pre-request status.
    fn cancel_search(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        self.debounce_deadline = None;
        self.search.cancel();
    }

    fn prev_page(&mut self) {
        if self.search.has_prev_page() {
            let page = self.search.page - 1;
            self.search.set_page(page);
            self.dispatch_search();
        }
    }

    fn next_page(&mut self) {
        if self.search.has_next_page() {
            let page = self.search.page + 1;
            self.search.set_page(page);
            self.dispatch_search();
        }
    }

    fn resort(&mut self) {
        self.sorted = sort_order(&self.search.items, self.sort_key, self.sort_dir);
        if self.sorted.is_empty() {
            self.results_state.select(None);
        } else if self
            .results_state
            .selected()
            .is_none_or(|i| i >= self.sorted.len())
        {
            self.results_state.select(Some(0));
        }
    }

    fn move_selection_down(&mut self) {
        let len = self.sorted.len();
        if len == 0 {
            return;
        }
        let next = match self.results_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.results_state.select(Some(next));
    }

    fn move_selection_up(&mut self) {
        let len = self.sorted.len();
        if len == 0 {
            return;
        }
        let next = match self.results_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.results_state.select(Some(next));
    }

    fn open_selected(&mut self) {
        let Some(sel) = self.results_state.selected() else {
            return;
        };
        let Some(&idx) = self.sorted.get(sel) else {
            return;
        };
        let Some(anime) = self.search.items.get(idx) else {
            return;
        };
        let id = anime.mal_id;
        self.detail_history.clear();
        self.open_detail(id);
    }

    // ------------------------------------------------------------------
    // Detail controller
    // ------------------------------------------------------------------

    /// Start a detail-screen visit: the primary record and all four
    /// auxiliary collections fetch concurrently, each with its own
    /// status and token.
    fn open_detail(&mut self, id: u64) {
        info!(mal_id = id, "Opening detail");

        self.abort_detail_tasks();
        self.detail.clear();
        self.panes.reset();
        self.detail_id = Some(id);
        self.view = View::Detail;

        self.spawn_primary(id);
        self.spawn_characters(id);
        self.spawn_reviews(id);
        self.spawn_streaming(id);
        self.spawn_recommendations(id);
    }

    fn spawn_primary(&mut self, id: u64) {
        let req = self.detail.item.begin();
        let provider = Arc::clone(&self.provider);
        self.spawn_detail_task(
            req,
            async move { provider.anime(id).await.map(Box::new) },
            AppMessage::DetailLoaded,
            AppMessage::DetailFailed,
        );
    }

    fn spawn_characters(&mut self, id: u64) {
        let req = self.detail.characters.begin();
        let provider = Arc::clone(&self.provider);
        self.spawn_detail_task(
            req,
            async move { provider.characters(id).await },
            AppMessage::CharactersLoaded,
            AppMessage::CharactersFailed,
        );
    }

    fn spawn_reviews(&mut self, id: u64) {
        let req = self.detail.reviews.begin();
        let provider = Arc::clone(&self.provider);
        self.spawn_detail_task(
            req,
            async move { provider.reviews(id).await },
            AppMessage::ReviewsLoaded,
            AppMessage::ReviewsFailed,
        );
    }

    fn spawn_streaming(&mut self, id: u64) {
        let req = self.detail.streaming.begin();
        let provider = Arc::clone(&self.provider);
        self.spawn_detail_task(
            req,
            async move { provider.streaming(id).await },
            AppMessage::StreamingLoaded,
            AppMessage::StreamingFailed,
        );
    }

    fn spawn_recommendations(&mut self, id: u64) {
        let req = self.detail.recommendations.begin();
        let provider = Arc::clone(&self.provider);
        self.spawn_detail_task(
            req,
            async move { provider.recommendations(id).await },
            AppMessage::RecommendationsLoaded,
            AppMessage::RecommendationsFailed,
        );
    }

    fn spawn_detail_task<T, Fut>(
        &mut self,
        req: RequestId,
        fut: Fut,
        ok: fn(RequestId, T) -> AppMessage,
        err: fn(RequestId, FetchFailure) -> AppMessage,
    ) where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let tx = self.msg_tx.clone();
        let handle = tokio::spawn(async move {
            match fut.await {
                Ok(data) => {
                    let _ = tx.send(ok(req, data));
                }
                Err(e) => {
                    let _ = tx.send(err(req, e.into()));
                }
            }
        });
        self.detail_tasks.push(handle);
    }

    fn fetch_poster(&mut self, url: String) {
        let Some(mal_id) = self.detail_id else {
            return;
        };
        let cache = Arc::clone(&self.image_cache);
        let tx = self.msg_tx.clone();
        let handle = tokio::spawn(async move {
            match cache.download(&url).await {
                Ok(()) => {
                    let _ = tx.send(AppMessage::PosterFetched(mal_id));
                }
                Err(e) => debug!(error = %e, "Poster download failed"),
            }
        });
        self.detail_tasks.push(handle);
    }

    fn load_poster(&mut self) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };
        let Some(url) = self
            .detail
            .item
            .data
            .as_ref()
            .and_then(|a| a.poster_url())
        else {
            return;
        };
        if let Some(img) = self.image_cache.get(url) {
            self.panes.poster = Some(picker.new_resize_protocol(img));
        }
    }

    /// Leaving a detail screen aborts its outstanding fetches. Aborted
    /// tasks never report, so each loading section is rolled back to
    /// its pre-request status.
    fn abort_detail_tasks(&mut self) {
        for task in self.detail_tasks.drain(..) {
            task.abort();
        }
        self.detail.cancel_pending();
    }

    fn navigate_back(&mut self) {
        if let Some(prev) = self.detail_history.pop() {
            self.open_detail(prev);
        } else {
            self.abort_detail_tasks();
            self.detail.clear();
            self.panes.reset();
            self.detail_id = None;
            self.view = View::Search;
        }
    }

    fn cycle_tab(&mut self, forward: bool) {
        let tabs = visible_tabs(&self.detail);
        if tabs.is_empty() {
            return;
        }
        let pos = tabs.iter().position(|t| *t == self.panes.tab).unwrap_or(0);
        let next = if forward {
            (pos + 1) % tabs.len()
        } else {
            (pos + tabs.len() - 1) % tabs.len()
        };
        self.panes.tab = tabs[next];
    }

    fn detail_move(&mut self, delta: i32) {
        match self.panes.tab {
            DetailTab::Overview => {
                self.panes.overview_scroll = if delta > 0 {
                    self.panes.overview_scroll.saturating_add(1)
                } else {
                    self.panes.overview_scroll.saturating_sub(1)
                };
            }
            DetailTab::Reviews => {
                self.panes.reviews_scroll = if delta > 0 {
                    self.panes.reviews_scroll.saturating_add(1)
                } else {
                    self.panes.reviews_scroll.saturating_sub(1)
                };
            }
            DetailTab::Characters => {
                let len = self
                    .detail
                    .characters
                    .data
                    .as_ref()
                    .map(|d| self.panes.char_pager.slice(d).len())
                    .unwrap_or(0);
                move_list(&mut self.panes.characters_state, len, delta);
            }
            DetailTab::Streaming => {
                let len = self
                    .detail
                    .streaming
                    .data
                    .as_ref()
                    .map(|d| d.len())
                    .unwrap_or(0);
                move_list(&mut self.panes.streaming_state, len, delta);
            }
            DetailTab::Recommendations => {
                let len = self
                    .detail
                    .recommendations
                    .data
                    .as_ref()
                    .map(|d| d.iter().filter(|r| r.entry.is_some()).count())
                    .unwrap_or(0);
                move_list(&mut self.panes.recommendations_state, len, delta);
            }
            DetailTab::Trailer => {}
        }
    }

    fn detail_pager_prev(&mut self) {
        match self.panes.tab {
            DetailTab::Characters => {
                self.panes.char_pager.prev();
                self.panes.characters_state.select(Some(0));
            }
            DetailTab::Reviews => {
                self.panes.review_pager.prev();
                self.panes.reviews_scroll = 0;
            }
            _ => {}
        }
    }

    fn detail_pager_next(&mut self) {
        match self.panes.tab {
            DetailTab::Characters => {
                let len = self
                    .detail
                    .characters
                    .data
                    .as_ref()
                    .map(Vec::len)
                    .unwrap_or(0);
                self.panes.char_pager.next(len);
                self.panes.characters_state.select(Some(0));
            }
            DetailTab::Reviews => {
                let len = self.detail.reviews.data.as_ref().map(Vec::len).unwrap_or(0);
                self.panes.review_pager.next(len);
                self.panes.reviews_scroll = 0;
            }
            _ => {}
        }
    }

    fn detail_toggle_show_all(&mut self) {
        match self.panes.tab {
            DetailTab::Characters => {
                self.panes.char_pager.toggle_show_all();
                self.panes.characters_state.select(Some(0));
            }
            DetailTab::Reviews => {
                self.panes.review_pager.toggle_show_all();
                self.panes.reviews_scroll = 0;
            }
            _ => {}
        }
    }

    /// Manual recovery: re-fetch whatever failed. A failed primary
    /// record restarts the whole visit.
    fn reload_failed_sections(&mut self) {
        let Some(id) = self.detail_id else {
            return;
        };

        if self.detail.item.is_failed() {
            self.open_detail(id);
            return;
        }

        if self.detail.characters.is_failed() {
            self.spawn_characters(id);
        }
        if self.detail.reviews.is_failed() {
            self.spawn_reviews(id);
        }
        if self.detail.streaming.is_failed() {
            self.spawn_streaming(id);
        }
        if self.detail.recommendations.is_failed() {
            self.spawn_recommendations(id);
        }
    }

    fn open_selected_recommendation(&mut self) {
        let Some(sel) = self.panes.recommendations_state.selected() else {
            return;
        };
        let Some(recs) = self.detail.recommendations.data.as_ref() else {
            return;
        };
        let ids: Vec<u64> = recs
            .iter()
            .filter_map(|r| r.entry.as_ref())
            .map(|e| e.mal_id)
            .collect();
        let Some(&id) = ids.get(sel) else {
            return;
        };

        if let Some(current) = self.detail_id {
            self.detail_history.push(current);
        }
        self.open_detail(id);
    }

    // ------------------------------------------------------------------
    // Shared helpers
    // ------------------------------------------------------------------

    fn toggle_theme(&mut self) {
        if let Err(e) = self.config.toggle_theme() {
            error!("Failed to persist theme: {}", e);
        }
        self.theme = Theme::from_name(&self.config.ui.theme);
    }

    fn toggle_help(&mut self) {
        if self.view == View::Help {
            self.view = self.previous_view;
        } else {
            self.previous_view = self.view;
            self.view = View::Help;
        }
    }

    fn show_toast(&mut self, text: &str, level: ToastLevel) {
        self.toast = Some(Toast {
            text: text.to_string(),
            level,
            until: Instant::now() + TOAST_TTL,
        });
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = frame.area();
        let dialog_area = Rect {
            x: area.width.saturating_sub(70) / 2,
            y: area.height.saturating_sub(24) / 2,
            width: 70.min(area.width),
            height: 24.min(area.height),
        };

        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.accent));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let rows = vec![
            Row::new(vec!["Global", "?", "Toggle Help"]),
            Row::new(vec!["", "Ctrl-C", "Quit"]),
            Row::new(vec!["", "Ctrl-T", "Toggle light/dark theme"]),
            Row::new(vec!["Search", "type", "Search as you type (debounced)"]),
            Row::new(vec!["", "Esc", "Clear query (browse popular)"]),
            Row::new(vec!["", "Tab/↑/↓", "Navigate results"]),
            Row::new(vec!["", "←/→", "Previous / next page"]),
            Row::new(vec!["", "Ctrl-S", "Cycle sort key"]),
            Row::new(vec!["", "Ctrl-D", "Flip sort direction"]),
            Row::new(vec!["", "Enter", "Open detail"]),
            Row::new(vec!["Detail", "Tab/h/l", "Switch tab"]),
            Row::new(vec!["", "j/k", "Scroll / navigate"]),
            Row::new(vec!["", "←/→", "Characters/Reviews page"]),
            Row::new(vec!["", "a", "Toggle show all"]),
            Row::new(vec!["", "r", "Reload failed sections"]),
            Row::new(vec!["", "Enter", "Open recommendation"]),
            Row::new(vec!["", "Esc/q", "Back"]),
        ];

        let table = Table::new(
            rows,
            &[
                Constraint::Percentage(15),
                Constraint::Percentage(20),
                Constraint::Percentage(65),
            ],
        )
        .header(
            Row::new(vec!["Context", "Key", "Action"]).style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(self.accent),
            ),
        )
        .block(Block::default().borders(Borders::NONE));

        frame.render_widget(table, inner);
    }
}

fn move_list(state: &mut ListState, len: usize, delta: i32) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match (state.selected(), delta > 0) {
        (Some(i), true) => (i + 1).min(len - 1),
        (Some(0), false) => len - 1,
        (Some(i), false) => i - 1,
        (None, _) => 0,
    };
    state.select(Some(next));
}

pub fn init_terminal() -> io::Result<DefaultTerminal> {
    crossterm::terminal::enable_raw_mode()?;
    crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    Ok(ratatui::init())
}

pub fn restore_terminal() -> io::Result<()> {
    ratatui::restore();
    Ok(())
}

const YOMU_FRAMES: [&str; 4] = [
    r#"

  ██╗   ██╗
  ╚██╗ ██╔╝
   ╚████╔╝
    ╚██╔╝
     ██║
     ╚═╝

"#,
    r#"

  ██╗   ██╗  ██████╗
  ╚██╗ ██╔╝ ██╔═══██╗
   ╚████╔╝  ██║   ██║
    ╚██╔╝   ██║   ██║
     ██║    ╚██████╔╝
     ╚═╝     ╚═════╝

"#,
    r#"

  ██╗   ██╗  ██████╗  ███╗   ███╗
  ╚██╗ ██╔╝ ██╔═══██╗ ████╗ ████║
   ╚████╔╝  ██║   ██║ ██╔████╔██║
    ╚██╔╝   ██║   ██║ ██║╚██╔╝██║
     ██║    ╚██████╔╝ ██║ ╚═╝ ██║
     ╚═╝     ╚═════╝  ╚═╝     ╚═╝

"#,
    r#"

  ██╗   ██╗  ██████╗  ███╗   ███╗ ██╗   ██╗
  ╚██╗ ██╔╝ ██╔═══██╗ ████╗ ████║ ██║   ██║
   ╚████╔╝  ██║   ██║ ██╔████╔██║ ██║   ██║
    ╚██╔╝   ██║   ██║ ██║╚██╔╝██║ ██║   ██║
     ██║    ╚██████╔╝ ██║ ╚═╝ ██║ ╚██████╔╝
     ╚═╝     ╚═════╝  ╚═╝     ╚═╝  ╚═════╝

"#,
];

const YOMU_TAGLINE: &str = "読む - to read";

pub fn play_splash(terminal: &mut DefaultTerminal, accent: Color) -> io::Result<()> {
    use ratatui::{
        layout::Alignment,
        text::{Line, Text},
    };

    for frame in &YOMU_FRAMES {
        terminal.draw(|f| {
            let area = f.area();
            let text = Text::styled(*frame, Style::default().fg(accent));

            let lines = frame.lines().count() as u16;
            let y_offset = area.height.saturating_sub(lines) / 2;

            let centered_area = Rect {
                x: 0,
                y: y_offset,
                width: area.width,
                height: lines + 2,
            };

            let para = Paragraph::new(text).alignment(Alignment::Center);
            f.render_widget(para, centered_area);
        })?;

        thread::sleep(Duration::from_millis(150));
    }

    terminal.draw(|f| {
        let area = f.area();
        let frame_text = YOMU_FRAMES[3];
        let lines = frame_text.lines().count() as u16;
        let y_offset = area.height.saturating_sub(lines + 2) / 2;

        let logo_area = Rect {
            x: 0,
            y: y_offset,
            width: area.width,
            height: lines,
        };

        let tagline_area = Rect {
            x: 0,
            y: y_offset + lines,
            width: area.width,
            height: 2,
        };

        let logo = Paragraph::new(Text::styled(frame_text, Style::default().fg(accent)))
            .alignment(Alignment::Center);
        let tagline = Paragraph::new(Line::styled(
            YOMU_TAGLINE,
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(Alignment::Center);

        f.render_widget(logo, logo_area);
        f.render_widget(tagline, tagline_area);
    })?;

    thread::sleep(Duration::from_millis(600));

    Ok(())
}
