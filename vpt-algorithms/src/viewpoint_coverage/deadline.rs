use std::time::{Duration, Instant};

/// Wall-clock budget handed to the builder. `None` never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started_at: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            started_at: Instant::now(),
            budget,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn from_millis(budget_ms: u64) -> Self {
        Self::new(Some(Duration::from_millis(budget_ms)))
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.budget.is_some_and(|budget| self.elapsed() >= budget)
    }
}
