use std::time::{Duration, Instant};

/// How long the "copied" marker stays on a reply suggestion.
pub const COPY_FEEDBACK: Duration = Duration::from_millis(2000);

/// How long a status-bar toast stays visible.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expansion {
    #[default]
    Collapsed,
    Expanded,
}

impl Expansion {
    pub fn toggle(self) -> Self {
        match self {
            Expansion::Collapsed => Expansion::Expanded,
            Expansion::Expanded => Expansion::Collapsed,
        }
    }

    pub fn is_expanded(self) -> bool {
        self == Expansion::Expanded
    }
}

/// Copy-to-clipboard feedback. Copying again replaces the pending reset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CopyFeedback {
    #[default]
    Idle,
    Copied { text: String, until: Instant },
}

impl CopyFeedback {
    pub fn copied(&mut self, text: impl Into<String>, now: Instant) {
        *self = CopyFeedback::Copied {
            text: text.into(),
            until: now + COPY_FEEDBACK,
        };
    }

    /// Returns true when the marker was cleared by this tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = matches!(self, CopyFeedback::Copied { until, .. } if now >= *until);
        if expired {
            *self = CopyFeedback::Idle;
        }
        expired
    }

    pub fn is_copied(&self, text: &str) -> bool {
        matches!(self, CopyFeedback::Copied { text: copied, .. } if copied == text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    until: Instant,
}

/// Single-slot toast shown in the status bar.
#[derive(Debug, Default)]
pub struct StatusLine {
    current: Option<Toast>,
}

impl StatusLine {
    pub fn info(&mut self, message: impl Into<String>, now: Instant) {
        self.show(ToastKind::Info, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.show(ToastKind::Error, message.into(), now);
    }

    fn show(&mut self, kind: ToastKind, message: String, now: Instant) {
        self.current = Some(Toast {
            kind,
            message,
            until: now + TOAST_DURATION,
        });
    }

    pub fn tick(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|t| now >= t.until) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}
