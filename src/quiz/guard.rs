use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Marks actions that are waiting on I/O, so the same action for the same key
/// isn't started twice.
#[derive(Debug)]
pub struct InFlight<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K: Eq + Hash> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> InFlight<K> {
    /// `None` while another guard for `key` is alive.
    pub fn try_begin(&self, key: K) -> Option<InFlightGuard<K>> {
        let mut active = self.active.lock().ok()?;
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            active: self.active.clone(),
            key,
        })
    }

    pub fn is_active(&self, key: &K) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(key))
            .unwrap_or(false)
    }
}

/// Clears the in-flight mark when dropped.
#[derive(Debug)]
pub struct InFlightGuard<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.key);
        }
    }
}

/// One async lock per key. Entries nobody holds or waits on are pruned
/// whenever a lock is handed out, so the map only grows with live keys.
#[derive(Debug)]
pub struct ChatLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for ChatLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> ChatLocks<K> {
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn second_begin_is_refused_until_guard_drops() {
        let loading = InFlight::default();
        let guard = loading.try_begin(7i64).unwrap();
        assert!(loading.is_active(&7));
        assert!(loading.try_begin(7).is_none());
        assert!(loading.try_begin(8).is_some());

        drop(guard);
        assert!(!loading.is_active(&7));
        assert!(loading.try_begin(7).is_some());
    }

    #[tokio::test]
    async fn same_key_waits_for_the_holder() {
        let locks = Arc::new(ChatLocks::default());
        let held = locks.lock(1i64).await;

        let waiter = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.lock(1).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn idle_keys_are_pruned() {
        let locks = ChatLocks::default();
        let first = locks.lock(1i64).await;
        drop(locks.lock(2).await);
        assert_eq!(locks.len(), 2);

        // 2 is idle and goes, 1 is still held and stays
        let third = locks.lock(3).await;
        assert_eq!(locks.len(), 2);

        drop(first);
        drop(third);
        drop(locks.lock(4).await);
        assert_eq!(locks.len(), 1);
    }
}
