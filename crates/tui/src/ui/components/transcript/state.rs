use chrono::{DateTime, Local};
use hookflow_types::WebhookResponse;
use hookflow_util::{DownloadLink, ResponseView, classify, sanitize_markdown};

/// One successful workflow run.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub timestamp: DateTime<Local>,
    pub title: String,
    pub response: WebhookResponse,
    /// Sanitized Markdown of `response.message`, when there is one.
    pub message: Option<String>,
    pub view: ResponseView,
    pub download: Option<DownloadLink>,
}

impl TranscriptEntry {
    pub fn new(title: impl Into<String>, response: WebhookResponse) -> Self {
        let message = response
            .message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .map(sanitize_markdown);
        let view = classify(response.data.as_ref());
        let download = DownloadLink::from_response(&response);
        Self {
            timestamp: Local::now(),
            title: title.into(),
            response,
            message,
            view,
            download,
        }
    }
}

/// Entries in arrival order plus a scroll offset counted in lines from the
/// bottom, so new entries stay in view until the user scrolls up.
#[derive(Debug, Default)]
pub struct TranscriptState {
    entries: Vec<TranscriptEntry>,
    scroll_from_bottom: u16,
}

impl TranscriptState {
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
        self.scroll_from_bottom = 0;
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Download link of the most recent entry that has one.
    pub fn latest_download(&self) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|entry| entry.download.is_some())
    }

    pub fn scroll_from_bottom(&self) -> u16 {
        self.scroll_from_bottom
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Keep the offset within the content once its height is known.
    pub fn clamp_scroll(&mut self, max: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(file_url: Option<&str>) -> WebhookResponse {
        WebhookResponse {
            success: true,
            message: Some("Done <script>alert(1)</script>".into()),
            data: Some(json!({ "rows": 3 })),
            file_url: file_url.map(str::to_string),
            file_name: None,
        }
    }

    #[test]
    fn entries_precompute_sanitized_message_and_view() {
        let entry = TranscriptEntry::new("Report", response(None));
        assert_eq!(entry.message.as_deref(), Some("Done "));
        assert_eq!(entry.view, ResponseView::KeyValue(vec![("rows".into(), "3".into())]));
        assert!(entry.download.is_none());
    }

    #[test]
    fn latest_download_skips_entries_without_links() {
        let mut transcript = TranscriptState::default();
        transcript.push(TranscriptEntry::new("First", response(Some("/files/a.pdf"))));
        transcript.push(TranscriptEntry::new("Second", response(None)));
        let latest = transcript.latest_download().unwrap();
        assert_eq!(latest.title, "First");
        assert_eq!(latest.download.as_ref().unwrap().url, "/files/a.pdf");
    }

    #[test]
    fn new_entries_reset_scroll() {
        let mut transcript = TranscriptState::default();
        transcript.scroll_up(5);
        transcript.scroll_down(2);
        assert_eq!(transcript.scroll_from_bottom(), 3);
        transcript.clamp_scroll(1);
        assert_eq!(transcript.scroll_from_bottom(), 1);
        transcript.push(TranscriptEntry::new("Run", response(None)));
        assert_eq!(transcript.scroll_from_bottom(), 0);
    }
}
