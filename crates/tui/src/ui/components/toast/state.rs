use hookflow_types::Severity;

/// Ticks a toast stays visible. The runtime ticks every 100 ms while any
/// toast is showing.
pub const TOAST_TICKS: u32 = 40;

const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub severity: Severity,
    pub message: String,
    remaining: u32,
}

/// Newest last.
#[derive(Debug, Default)]
pub struct ToastStack {
    toasts: Vec<Toast>,
}

impl ToastStack {
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.toasts.push(Toast {
            severity,
            message: message.into(),
            remaining: TOAST_TICKS,
        });
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    /// Age every toast by one tick and drop expired ones. Returns whether
    /// anything disappeared.
    pub fn tick(&mut self) -> bool {
        let before = self.toasts.len();
        for toast in &mut self.toasts {
            toast.remaining = toast.remaining.saturating_sub(1);
        }
        self.toasts.retain(|toast| toast.remaining > 0);
        before != self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }
}
