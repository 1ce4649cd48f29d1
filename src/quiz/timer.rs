use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How often a running timer looks at the clock.
pub const TICK: Duration = Duration::from_millis(50);

/// Start time and limit of the question on screen.
#[derive(Debug, Clone, Copy)]
pub struct QuestionClock {
    started: Instant,
    limit: Duration,
}

impl QuestionClock {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// 1.0 right after the start, 0.0 once the limit is reached.
    pub fn fraction_remaining(&self) -> f32 {
        if self.limit.is_zero() {
            return 0.0;
        }
        let used = self.elapsed().as_secs_f32() / self.limit.as_secs_f32();
        (1.0 - used).clamp(0.0, 1.0)
    }
}

/// Runs `on_expire` once when the question's time is up, unless cancelled first.
///
/// Dropping the timer cancels it.
#[derive(Debug)]
pub struct QuestionTimer {
    clock: QuestionClock,
    handle: Option<JoinHandle<()>>,
}

impl QuestionTimer {
    pub fn start<F, Fut>(limit: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let clock = QuestionClock::start(limit);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            loop {
                ticker.tick().await;
                if clock.is_expired() {
                    break;
                }
            }
            on_expire().await;
        });
        Self {
            clock,
            handle: Some(handle),
        }
    }

    pub fn clock(&self) -> &QuestionClock {
        &self.clock
    }

    /// Safe to call any number of times, also after the timer fired.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// At most one live timer per key (one per chat in the bot).
#[derive(Debug)]
pub struct TimerRegistry<K> {
    timers: Mutex<HashMap<K, QuestionTimer>>,
}

impl<K> Default for TimerRegistry<K> {
    fn default() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> TimerRegistry<K> {
    /// Starts a timer for `key`, cancelling whatever timer it had before.
    pub fn arm<F, Fut>(&self, key: K, limit: Duration, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let timer = QuestionTimer::start(limit, on_expire);
        if let Ok(mut timers) = self.timers.lock() {
            // The replaced timer is cancelled when dropped.
            timers.insert(key, timer);
        }
    }

    pub fn disarm(&self, key: &K) {
        if let Ok(mut timers) = self.timers.lock() {
            timers.remove(key);
        }
    }

    pub fn fraction_remaining(&self, key: &K) -> Option<f32> {
        let timers = self.timers.lock().ok()?;
        let timer = timers.get(key)?;
        Some(timer.clock().fraction_remaining())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() -> std::future::Ready<()> + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = fired.clone();
        (fired, move || {
            hook.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_limit() {
        let (fired, on_expire) = counter();
        let timer = QuestionTimer::start(Duration::from_secs(10), on_expire);

        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (fired, on_expire) = counter();
        let mut timer = QuestionTimer::start(Duration::from_secs(5), on_expire);

        tokio::time::sleep(Duration::from_secs(2)).await;
        timer.cancel();
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_cancels_previous_timer() {
        let registry = TimerRegistry::default();
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        registry.arm(1u64, Duration::from_secs(5), on_first);
        tokio::time::sleep(Duration::from_secs(3)).await;
        registry.arm(1u64, Duration::from_secs(5), on_second);
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_stops_timer() {
        let registry = TimerRegistry::default();
        let (fired, on_expire) = counter();
        registry.arm("chat", Duration::from_secs(5), on_expire);
        assert!(registry.fraction_remaining(&"chat").is_some());

        registry.disarm(&"chat");
        registry.disarm(&"chat");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(registry.fraction_remaining(&"chat"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn fraction_remaining_counts_down() {
        let clock = QuestionClock::start(Duration::from_secs(10));
        assert!((clock.fraction_remaining() - 1.0).abs() < 1e-6);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!((clock.fraction_remaining() - 0.6).abs() < 1e-3);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(clock.fraction_remaining(), 0.0);
        assert!(clock.is_expired());
        assert_eq!(QuestionClock::start(Duration::ZERO).fraction_remaining(), 0.0);
    }
}
