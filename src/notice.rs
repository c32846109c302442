use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_NOTICE_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient notification ("toast") shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: Option<String>,
    pub level: NoticeLevel,
    /// How long the notice stays up. Left `None`, the notifier's configured
    /// duration applies.
    pub duration: Option<Duration>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, Some(description.into()), NoticeLevel::Success)
    }

    /// Success with a title and nothing else.
    pub fn success_title(title: impl Into<String>) -> Self {
        Self::new(title, None, NoticeLevel::Success)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, Some(description.into()), NoticeLevel::Error)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(title, None, NoticeLevel::Info)
    }

    fn new(title: impl Into<String>, description: Option<String>, level: NoticeLevel) -> Self {
        Self {
            title: title.into(),
            description,
            level,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Queue of pending notices. Cloning shares the queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    queue: Arc<Mutex<VecDeque<Notice>>>,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_NOTICE_SECS))
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            duration,
        }
    }

    pub fn push(&self, mut notice: Notice) {
        notice.duration.get_or_insert(self.duration);
        match notice.level {
            NoticeLevel::Error => tracing::debug!("notice (error): {}", notice.title),
            _ => tracing::debug!("notice: {}", notice.title),
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(notice);
        }
    }

    /// Take every queued notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.queue
            .lock()
            .map(|mut q| q.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
