use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// Per-session one-shot messages, kept in enqueue order per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashQueue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    success: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    error: Vec<String>,
}

impl FlashQueue {
    pub fn enqueue(&mut self, kind: FlashKind, message: impl Into<String>) {
        self.slot_mut(kind).push(message.into());
    }

    /// Removes and returns every message of `kind`.
    pub fn drain(&mut self, kind: FlashKind) -> Vec<String> {
        std::mem::take(self.slot_mut(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }

    fn slot_mut(&mut self, kind: FlashKind) -> &mut Vec<String> {
        match kind {
            FlashKind::Success => &mut self.success,
            FlashKind::Error => &mut self.error,
        }
    }
}

/// Messages drained for a single render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlashMessages {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl FlashMessages {
    pub fn drain_from(queue: &mut FlashQueue) -> Self {
        Self {
            success: queue.drain(FlashKind::Success),
            error: queue.drain(FlashKind::Error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }
}
