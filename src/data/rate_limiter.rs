use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Request-weight budget per wall-clock minute, shared by every clone.
#[derive(Clone)]
pub struct GlobalRateLimiter {
    inner: Arc<Mutex<InnerLimiter>>,
}

struct InnerLimiter {
    used_weight: u32,
    // Minutes since epoch for the minute currently being counted
    current_minute_idx: u64,
    limit: u32,
}

impl GlobalRateLimiter {
    pub fn new(limit: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InnerLimiter {
                used_weight: 0,
                current_minute_idx: Self::get_current_minute_idx(),
                limit,
            })),
        }
    }

    /// Acquires permission to use `cost` weight, sleeping until the next minute when saturated.
    pub async fn acquire(&self, cost: u32, context: &str) {
        loop {
            let (wait_duration, used, limit) = {
                let mut guard = self.inner.lock().await;
                let now_idx = Self::get_current_minute_idx();

                if now_idx > guard.current_minute_idx {
                    guard.used_weight = 0;
                    guard.current_minute_idx = now_idx;
                }

                if guard.used_weight + cost <= guard.limit {
                    guard.used_weight += cost;
                    return;
                }

                let now_secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or(Duration::ZERO)
                    .as_secs();
                let wait_secs = 60 - now_secs % 60;

                // Small buffer so we land inside the next minute
                let wait = Duration::from_secs(wait_secs) + Duration::from_millis(100);

                (wait, guard.used_weight, guard.limit)
            };

            log::warn!(
                "Rate limit saturated for [{}]. Used: {}/{}. Waiting {:.1}s...",
                context,
                used,
                limit,
                wait_duration.as_secs_f64()
            );

            tokio::time::sleep(wait_duration).await;
        }
    }

    #[cfg(test)]
    async fn used_weight(&self) -> u32 {
        self.inner.lock().await.used_weight
    }

    fn get_current_minute_idx() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_budget() {
        let limiter = GlobalRateLimiter::new(100);
        let other = limiter.clone();
        limiter.acquire(2, "a").await;
        other.acquire(3, "b").await;
        let used = limiter.used_weight().await;
        // A minute boundary between the calls would reset the counter.
        assert!(used == 5 || used == 3);
    }
}
