use std::time::{Duration, Instant};

/// Counters for the fire-and-forget link. There are no acks, so this only
/// says whether the local socket accepted the datagram.
#[derive(Debug, Clone, Default)]
pub struct LinkHealth {
    pub sent: u64,
    pub failed: u64,
    pub consecutive_failures: u32,
    pub last_sent: Option<Instant>,
    pub last_error: Option<String>,
}

impl LinkHealth {
    pub fn on_sent(&mut self) {
        self.sent += 1;
        self.consecutive_failures = 0;
        self.last_sent = Some(Instant::now());
    }

    pub fn on_failed(&mut self, err: &str) {
        self.failed += 1;
        self.consecutive_failures += 1;
        self.last_error = Some(err.to_string());
    }

    pub fn since_last_send(&self) -> Option<Duration> {
        self.last_sent.map(|t| t.elapsed())
    }
}
