//! Fetch lifecycle state for both screens.
//!
//! Every network request follows idle -> loading -> {succeeded, failed}.
//! Results are committed by token: only the response carrying the most
//! recently issued `RequestId` may touch state, so stale responses
//! arriving out of order are dropped regardless of arrival time.

pub mod detail;
pub mod search;

pub use detail::{DetailState, Pager};
pub use search::{SearchState, SortDir, SortKey, sort_order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Monotonically-assigned token identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestId(u64);

impl RequestId {
    fn next(self) -> Self {
        RequestId(self.0 + 1)
    }
}

/// Status/data/error triple for one independently fetched collection.
#[derive(Debug, Clone, Default)]
pub struct Section<T> {
    pub status: RequestStatus,
    pub data: Option<T>,
    pub error: Option<String>,
    latest: RequestId,
    prev_status: RequestStatus,
}

impl<T> Section<T> {
    /// Issue a new request token and transition to loading.
    pub fn begin(&mut self) -> RequestId {
        self.prev_status = self.status;
        self.status = RequestStatus::Loading;
        self.error = None;
        self.latest = self.latest.next();
        self.latest
    }

    /// Commit a successful response. Stale tokens are dropped.
    pub fn succeed(&mut self, req: RequestId, data: T) -> bool {
        if !self.accepts(req) {
            return false;
        }
        self.status = RequestStatus::Succeeded;
        self.data = Some(data);
        true
    }

    /// Commit a failure. Stale tokens are dropped; existing data stays.
    pub fn fail(&mut self, req: RequestId, error: String) -> bool {
        if !self.accepts(req) {
            return false;
        }
        self.status = RequestStatus::Failed;
        self.error = Some(error);
        true
    }

    /// Canceling the in-flight request restores the pre-request status
    /// and records no error. Its response can no longer commit even if
    /// the abort raced: commits require the loading status.
    pub fn cancel(&mut self) {
        if self.status == RequestStatus::Loading {
            self.status = self.prev_status;
        }
    }

    /// Reset for a fresh screen visit. The token counter keeps running
    /// so responses from before the reset can never commit.
    pub fn clear(&mut self) {
        self.status = RequestStatus::Idle;
        self.prev_status = RequestStatus::Idle;
        self.data = None;
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    pub fn is_failed(&self) -> bool {
        self.status == RequestStatus::Failed
    }

    fn accepts(&self, req: RequestId) -> bool {
        req == self.latest && self.status == RequestStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_success() {
        let mut section: Section<Vec<u32>> = Section::default();
        assert_eq!(section.status, RequestStatus::Idle);

        let req = section.begin();
        assert_eq!(section.status, RequestStatus::Loading);

        assert!(section.succeed(req, vec![1, 2]));
        assert_eq!(section.status, RequestStatus::Succeeded);
        assert_eq!(section.data.as_deref(), Some(&[1, 2][..]));
        assert!(section.error.is_none());
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut section: Section<u32> = Section::default();
        let old = section.begin();
        let new = section.begin();

        assert!(!section.succeed(old, 1));
        assert_eq!(section.status, RequestStatus::Loading);
        assert!(section.data.is_none());

        assert!(section.succeed(new, 2));
        assert_eq!(section.data, Some(2));
    }

    #[test]
    fn test_stale_failure_dropped() {
        let mut section: Section<u32> = Section::default();
        let old = section.begin();
        let new = section.begin();

        assert!(!section.fail(old, "boom".into()));
        assert!(section.succeed(new, 7));
        assert_eq!(section.status, RequestStatus::Succeeded);
        assert!(section.error.is_none());
    }

    #[test]
    fn test_cancel_restores_previous_status() {
        let mut section: Section<u32> = Section::default();
        let first = section.begin();
        assert!(section.succeed(first, 1));

        section.begin();
        section.cancel();

        assert_eq!(section.status, RequestStatus::Succeeded);
        assert_eq!(section.data, Some(1));
        assert!(section.error.is_none());
    }

    #[test]
    fn test_response_after_cancel_dropped() {
        let mut section: Section<u32> = Section::default();
        let req = section.begin();
        section.cancel();

        assert!(!section.succeed(req, 9));
        assert_eq!(section.status, RequestStatus::Idle);
        assert!(section.data.is_none());
    }

    #[test]
    fn test_failure_keeps_existing_data() {
        let mut section: Section<u32> = Section::default();
        let req = section.begin();
        assert!(section.succeed(req, 5));

        let req = section.begin();
        assert!(section.fail(req, "HTTP 500".into()));
        assert_eq!(section.status, RequestStatus::Failed);
        assert_eq!(section.data, Some(5));
        assert_eq!(section.error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_clear_keeps_token_monotonic() {
        let mut section: Section<u32> = Section::default();
        let before = section.begin();
        section.clear();

        let after = section.begin();
        assert!(!section.succeed(before, 1));
        assert!(section.succeed(after, 2));
        assert_eq!(section.data, Some(2));
    }
}
