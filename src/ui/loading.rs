use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealReason {
    Preloaded,
    Ceiling,
}

/// Decides when the loading screen gives way to the tribute. Content is shown
/// once preloading finished and the minimum display time passed, or when the
/// hard ceiling is hit, whichever comes first.
#[derive(Debug, Clone)]
pub struct LoadingGate {
    started: Instant,
    min_display: Duration,
    ceiling: Duration,
    preload_finished: bool,
    revealed: bool,
}

impl LoadingGate {
    pub fn new(started: Instant, min_display: Duration, ceiling: Duration) -> Self {
        Self {
            started,
            min_display,
            ceiling,
            preload_finished: false,
            revealed: false,
        }
    }

    pub fn mark_finished(&mut self) {
        self.preload_finished = true;
    }

    /// Returns `Some` exactly once, at the first poll where content may be shown.
    pub fn poll(&mut self, now: Instant) -> Option<RevealReason> {
        if self.revealed {
            return None;
        }

        let elapsed = now.saturating_duration_since(self.started);
        let reason = if self.preload_finished && elapsed >= self.min_display {
            RevealReason::Preloaded
        } else if elapsed >= self.ceiling {
            RevealReason::Ceiling
        } else {
            return None;
        };

        self.revealed = true;
        Some(reason)
    }
}
