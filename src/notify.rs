//! Desktop notifications for yomu
//!
//! Used for events worth seeing outside the terminal, currently only
//! API rate limiting (the request can be retried manually from the UI).

use notify_rust::Notification;
use tracing::{debug, warn};

const APP_NAME: &str = "Yomu";

pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn rate_limited(&self, what: &str) {
        if !self.enabled {
            return;
        }

        let body = format!(
            "The {} request was throttled by the API. Press r in yomu to retry.",
            what
        );
        self.send("Rate limit reached", &body);
    }

    fn send(&self, summary: &str, body: &str) {
        debug!(summary = %summary, body = %body, "Sending notification");

        let result = Notification::new()
            .appname(APP_NAME)
            .summary(summary)
            .body(body)
            .timeout(5000)
            .show();

        if let Err(e) = result {
            warn!("Failed to send notification: {}", e);
        }
    }
}
