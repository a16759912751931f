use crate::catalog::{Anime, CharacterEdge, Recommendation, Review, StreamingLink};
use crate::state::Section;

pub const CHARACTERS_PAGE_SIZE: usize = 10;
pub const REVIEWS_PAGE_SIZE: usize = 4;

/// State for one detail-screen visit: the primary record plus four
/// auxiliary collections, each fetched and failing independently.
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub item: Section<Anime>,
    pub characters: Section<Vec<CharacterEdge>>,
    pub reviews: Section<Vec<Review>>,
    pub streaming: Section<Vec<StreamingLink>>,
    pub recommendations: Section<Vec<Recommendation>>,
}

impl DetailState {
    pub fn clear(&mut self) {
        self.item.clear();
        self.characters.clear();
        self.reviews.clear();
        self.streaming.clear();
        self.recommendations.clear();
    }

    /// Cancel whatever is still loading, restoring each section's
    /// pre-request status. Used when the in-flight fetch tasks are
    /// aborted on navigation.
    pub fn cancel_pending(&mut self) {
        self.item.cancel();
        self.characters.cancel();
        self.reviews.cancel();
        self.streaming.cancel();
        self.recommendations.cancel();
    }
}

/// Client-side pagination over an already-fetched collection, with a
/// show-all escape hatch.
#[derive(Debug, Clone, Copy)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
    pub show_all: bool,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            show_all: false,
        }
    }

    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        if self.show_all {
            return items;
        }
        let start = (self.page - 1) * self.page_size;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    pub fn next(&mut self, len: usize) {
        if self.page < self.total_pages(len) {
            self.page += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.page > 1 {
            self.page -= 1;
        }
    }

    pub fn toggle_show_all(&mut self) {
        self.show_all = !self.show_all;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RequestStatus;

    #[test]
    fn test_sections_fail_independently() {
        let mut detail = DetailState::default();
        let chars_req = detail.characters.begin();
        let reviews_req = detail.reviews.begin();
        let streams_req = detail.streaming.begin();
        let recs_req = detail.recommendations.begin();

        // 429 on characters only
        assert!(
            detail
                .characters
                .fail(chars_req, "Rate limited by the API (HTTP 429)".into())
        );

        assert_eq!(detail.characters.status, RequestStatus::Failed);
        assert_eq!(detail.reviews.status, RequestStatus::Loading);
        assert_eq!(detail.streaming.status, RequestStatus::Loading);
        assert_eq!(detail.recommendations.status, RequestStatus::Loading);

        assert!(detail.reviews.succeed(reviews_req, Vec::new()));
        assert!(detail.streaming.succeed(streams_req, Vec::new()));
        assert!(detail.recommendations.succeed(recs_req, Vec::new()));
        assert_eq!(detail.reviews.status, RequestStatus::Succeeded);
    }

    #[test]
    fn test_cancel_pending_restores_only_loading_sections() {
        let mut detail = DetailState::default();
        let req = detail.characters.begin();
        assert!(detail.characters.succeed(req, Vec::new()));

        detail.reviews.begin();
        detail.cancel_pending();

        assert_eq!(detail.characters.status, RequestStatus::Succeeded);
        assert_eq!(detail.reviews.status, RequestStatus::Idle);
        assert!(detail.reviews.error.is_none());
    }

    #[test]
    fn test_clear_resets_all_sections() {
        let mut detail = DetailState::default();
        let req = detail.item.begin();
        assert!(detail.item.succeed(req, Anime::default()));

        detail.clear();
        assert_eq!(detail.item.status, RequestStatus::Idle);
        assert!(detail.item.data.is_none());
    }

    #[test]
    fn test_pager_23_reviews_at_4_per_page() {
        let items: Vec<u32> = (0..23).collect();
        let mut pager = Pager::new(REVIEWS_PAGE_SIZE);

        assert_eq!(pager.total_pages(items.len()), 6);

        pager.page = 6;
        assert_eq!(pager.slice(&items), &[20, 21, 22]);

        // next at the last page is a no-op
        pager.next(items.len());
        assert_eq!(pager.page, 6);
    }

    #[test]
    fn test_pager_empty_collection_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let pager = Pager::new(CHARACTERS_PAGE_SIZE);
        assert_eq!(pager.total_pages(items.len()), 1);
        assert!(pager.slice(&items).is_empty());
    }

    #[test]
    fn test_pager_show_all() {
        let items: Vec<u32> = (0..23).collect();
        let mut pager = Pager::new(REVIEWS_PAGE_SIZE);
        pager.page = 3;
        pager.toggle_show_all();
        assert_eq!(pager.slice(&items).len(), 23);

        pager.toggle_show_all();
        assert_eq!(pager.slice(&items), &[8, 9, 10, 11]);
    }

    #[test]
    fn test_pager_first_page_slice() {
        let items: Vec<u32> = (0..23).collect();
        let pager = Pager::new(CHARACTERS_PAGE_SIZE);
        assert_eq!(pager.slice(&items), (0..10).collect::<Vec<_>>());
        assert_eq!(pager.total_pages(items.len()), 3);
    }

    #[test]
    fn test_pager_prev_stops_at_one() {
        let mut pager = Pager::new(4);
        pager.prev();
        assert_eq!(pager.page, 1);
    }
}
