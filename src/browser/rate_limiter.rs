//! Page-load throttling using a token bucket.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::BrowserSettings;

/// Token bucket limiting how often the session navigates
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
}

struct RateLimiterState {
    tokens: f64,
    last_update: Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
    min_delay: Duration,
    max_delay: Duration,
}

impl RateLimiterState {
    /// Take a token and return how long to sleep before navigating.
    fn next_delay(&mut self, now: Instant, jitter: f64) -> Duration {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            let delay_range = self.max_delay - self.min_delay;
            self.min_delay + delay_range.mul_f64(jitter)
        } else {
            // Wait for the next token
            let wait_time = (1.0 - self.tokens) / self.refill_rate;
            self.tokens = 0.0;
            Duration::from_secs_f64(wait_time) + self.min_delay
        }
    }
}

impl RateLimiter {
    /// `page_loads_per_minute` must be non-zero
    pub fn new(page_loads_per_minute: u32, min_delay_secs: f64, max_delay_secs: f64) -> Self {
        let max_tokens = page_loads_per_minute as f64;
        let refill_rate = page_loads_per_minute as f64 / 60.0;

        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                tokens: max_tokens,
                last_update: Instant::now(),
                max_tokens,
                refill_rate,
                min_delay: Duration::from_secs_f64(min_delay_secs),
                max_delay: Duration::from_secs_f64(max_delay_secs),
            })),
        }
    }

    /// Build from browser settings; `None` when throttling is disabled
    pub fn from_settings(settings: &BrowserSettings) -> Option<Self> {
        (settings.page_loads_per_minute > 0).then(|| {
            Self::new(
                settings.page_loads_per_minute,
                settings.min_delay_secs,
                settings.max_delay_secs,
            )
        })
    }

    /// Acquire a token, waiting if necessary
    pub async fn acquire(&self) {
        let delay = {
            let mut state = self.state.lock().await;
            state.next_delay(Instant::now(), jitter())
        };

        tokio::time::sleep(delay).await;
    }
}

/// Pseudo-random factor in 0.0..1.0 from the clock's sub-second part
fn jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    (nanos % 1000) as f64 / 1000.0
}
