use crate::catalog::{Anime, SearchPage};
use crate::state::{RequestId, RequestStatus};

/// Server-paginated search results plus the query/page that produced
/// them. Items are replaced wholesale on success and left untouched by
/// failures and cancellations.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub page: u32,
    pub items: Vec<Anime>,
    pub total_pages: u32,
    pub status: RequestStatus,
    pub error: Option<String>,
    latest: RequestId,
    prev_status: RequestStatus,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            page: 1,
            total_pages: 1,
            ..Self::default()
        }
    }

    /// Changing the query text always snaps back to page 1.
    pub fn set_query(&mut self, query: &str) {
        if query != self.query {
            self.query = query.to_string();
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.clamp(1, self.total_pages.max(1));
    }

    pub fn begin(&mut self) -> RequestId {
        self.prev_status = self.status;
        self.status = RequestStatus::Loading;
        self.error = None;
        self.latest = self.latest.next();
        self.latest
    }

    pub fn succeed(&mut self, req: RequestId, page: SearchPage) -> bool {
        if !self.accepts(req) {
            return false;
        }
        self.status = RequestStatus::Succeeded;
        self.items = page.data;
        self.total_pages = page.pagination.last_visible_page.max(1);
        true
    }

    pub fn fail(&mut self, req: RequestId, error: String) -> bool {
        if !self.accepts(req) {
            return false;
        }
        self.status = RequestStatus::Failed;
        self.error = Some(error);
        true
    }

    /// Canceling the in-flight request restores the pre-request status
    /// without recording an error.
    pub fn cancel(&mut self) {
        if self.status == RequestStatus::Loading {
            self.status = self.prev_status;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev_page(&self) -> bool {
        self.page > 1
    }

    fn accepts(&self, req: RequestId) -> bool {
        req == self.latest && self.status == RequestStatus::Loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Score,
    Popularity,
    Year,
    Title,
}

impl SortKey {
    pub fn as_display(&self) -> &'static str {
        match self {
            SortKey::Score => "Score",
            SortKey::Popularity => "Popularity",
            SortKey::Year => "Year",
            SortKey::Title => "Title",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortKey::Score => SortKey::Popularity,
            SortKey::Popularity => SortKey::Year,
            SortKey::Year => SortKey::Title,
            SortKey::Title => SortKey::Score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub fn toggle(&self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn as_arrow(&self) -> &'static str {
        match self {
            SortDir::Asc => "↑",
            SortDir::Desc => "↓",
        }
    }
}

/// Stable ordering of the current page for display, as indices into
/// `items`. Missing numeric keys sort as 0; titles compare
/// lexicographically. Equal keys preserve fetch order in both
/// directions.
pub fn sort_order(items: &[Anime], key: SortKey, dir: SortDir) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&ia, &ib| {
        let (a, b) = (&items[ia], &items[ib]);
        let ord = match key {
            SortKey::Score => a
                .score
                .unwrap_or(0.0)
                .total_cmp(&b.score.unwrap_or(0.0)),
            SortKey::Popularity => a.popularity.unwrap_or(0).cmp(&b.popularity.unwrap_or(0)),
            SortKey::Year => a.year.unwrap_or(0).cmp(&b.year.unwrap_or(0)),
            SortKey::Title => a.title.cmp(&b.title),
        };
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Pagination;

    fn page(ids: &[u64], last_visible_page: u32) -> SearchPage {
        SearchPage {
            data: ids
                .iter()
                .map(|&mal_id| Anime {
                    mal_id,
                    title: format!("anime {mal_id}"),
                    ..Anime::default()
                })
                .collect(),
            pagination: Pagination {
                last_visible_page,
                has_next_page: last_visible_page > 1,
                current_page: Some(1),
            },
        }
    }

    fn scored(items: &[(u64, Option<f64>)]) -> Vec<Anime> {
        items
            .iter()
            .map(|&(mal_id, score)| Anime {
                mal_id,
                score,
                ..Anime::default()
            })
            .collect()
    }

    #[test]
    fn test_new_query_resets_page() {
        let mut state = SearchState::new();
        state.total_pages = 7;
        state.set_page(4);
        assert_eq!(state.page, 4);

        state.set_query("naruto");
        assert_eq!(state.page, 1);
        assert_eq!(state.query, "naruto");
    }

    #[test]
    fn test_same_query_preserves_page_and_query() {
        let mut state = SearchState::new();
        state.set_query("naruto");
        state.total_pages = 5;
        state.set_page(3);

        state.set_query("naruto");
        assert_eq!(state.page, 3);
        assert_eq!(state.query, "naruto");
    }

    #[test]
    fn test_set_page_clamps() {
        let mut state = SearchState::new();
        state.total_pages = 5;
        state.set_page(9);
        assert_eq!(state.page, 5);
        state.set_page(0);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_success_sets_totals_and_items() {
        let mut state = SearchState::new();
        let req = state.begin();
        assert!(state.succeed(req, page(&[1, 2, 3], 5)));

        assert_eq!(state.status, RequestStatus::Succeeded);
        assert_eq!(state.items.len(), 3);
        assert_eq!(state.total_pages, 5);
        assert!(state.has_next_page());
        assert!(!state.has_prev_page());
    }

    #[test]
    fn test_last_request_wins() {
        let mut state = SearchState::new();
        let old = state.begin();
        let new = state.begin();

        // old response arrives after being superseded
        assert!(!state.succeed(old, page(&[1], 9)));
        assert!(state.items.is_empty());
        assert_eq!(state.status, RequestStatus::Loading);

        assert!(state.succeed(new, page(&[2], 2)));
        assert_eq!(state.items[0].mal_id, 2);
        assert_eq!(state.total_pages, 2);
    }

    #[test]
    fn test_failure_keeps_prior_results() {
        let mut state = SearchState::new();
        let req = state.begin();
        assert!(state.succeed(req, page(&[1, 2], 4)));
        state.set_page(2);

        let req = state.begin();
        assert!(state.fail(req, "API error: HTTP 500".into()));

        assert_eq!(state.status, RequestStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("API error: HTTP 500"));
        assert_eq!(state.items.len(), 2);
        assert_eq!(state.page, 2);
    }

    #[test]
    fn test_cancel_restores_status_and_items() {
        let mut state = SearchState::new();
        let req = state.begin();
        assert!(state.succeed(req, page(&[1], 1)));

        let req = state.begin();
        state.cancel();

        assert_eq!(state.status, RequestStatus::Succeeded);
        assert!(state.error.is_none());
        assert_eq!(state.items.len(), 1);

        // the canceled request's response can no longer commit
        assert!(!state.succeed(req, page(&[9], 9)));
        assert_eq!(state.items[0].mal_id, 1);
    }

    #[test]
    fn test_sort_score_desc_stable() {
        let items = scored(&[(1, Some(7.1)), (2, Some(9.0)), (3, Some(9.0)), (4, None)]);
        let order = sort_order(&items, SortKey::Score, SortDir::Desc);
        let ids: Vec<u64> = order.iter().map(|&i| items[i].mal_id).collect();
        // the two 9.0 entries keep their relative order; None sorts as 0
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_sort_score_asc_stable() {
        let items = scored(&[(1, Some(9.0)), (2, Some(9.0)), (3, None)]);
        let order = sort_order(&items, SortKey::Score, SortDir::Asc);
        let ids: Vec<u64> = order.iter().map(|&i| items[i].mal_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_title_lexicographic() {
        let mut items = scored(&[(1, None), (2, None), (3, None)]);
        items[0].title = "Bleach".into();
        items[1].title = "Akira".into();
        items[2].title = "Clannad".into();

        let order = sort_order(&items, SortKey::Title, SortDir::Asc);
        let titles: Vec<&str> = order.iter().map(|&i| items[i].title.as_str()).collect();
        assert_eq!(titles, vec!["Akira", "Bleach", "Clannad"]);
    }

    #[test]
    fn test_sort_year_missing_as_zero() {
        let mut items = scored(&[(1, None), (2, None)]);
        items[0].year = Some(1998);
        items[1].year = None;

        let order = sort_order(&items, SortKey::Year, SortDir::Desc);
        let ids: Vec<u64> = order.iter().map(|&i| items[i].mal_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
