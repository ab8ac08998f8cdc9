use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes work per user id. Different users never wait on each other;
/// an entry lives only while someone holds or waits for it.
#[derive(Debug, Default)]
pub struct UserLocks {
    entries: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

/// Held while the caller owns the user's turn. The mutex guard is declared
/// first so it is released before the entry is pruned.
pub struct UserLockGuard<'a> {
    _guard: OwnedMutexGuard<()>,
    _entry: EntryRef<'a>,
}

/// One reference to a user's entry. Dropping it removes the entry from the
/// map once nothing else refers to it, including when a waiting `lock` call
/// is cancelled.
struct EntryRef<'a> {
    locks: &'a UserLocks,
    user_id: i64,
    entry: Option<Arc<AsyncMutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, user_id: i64) -> UserLockGuard<'_> {
        let mutex = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(user_id).or_default())
        };
        let entry = EntryRef {
            locks: self,
            user_id,
            entry: Some(Arc::clone(&mutex)),
        };

        let guard = mutex.lock_owned().await;

        UserLockGuard {
            _guard: guard,
            _entry: entry,
        }
    }

    pub fn active_users(&self) -> usize {
        self.entries.lock().len()
    }
}

impl Drop for EntryRef<'_> {
    fn drop(&mut self) {
        self.entry.take();

        let mut entries = self.locks.entries.lock();
        if let Some(entry) = entries.get(&self.user_id) {
            if Arc::strong_count(entry) == 1 {
                entries.remove(&self.user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_released_after_use() {
        let locks = UserLocks::new();
        {
            let _a = locks.lock(1).await;
            let _b = locks.lock(2).await;
            assert_eq!(locks.active_users(), 2);
        }
        assert_eq!(locks.active_users(), 0);
    }

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(7).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_users(), 0);
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _held = locks.lock(1).await;
        let other = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leave_an_entry() {
        let locks = UserLocks::new();
        let held = locks.lock(3).await;

        let mut waiter = Box::pin(locks.lock(3));
        let timed_out = tokio::time::timeout(Duration::from_millis(10), &mut waiter).await;
        assert!(timed_out.is_err());

        drop(held);
        assert_eq!(locks.active_users(), 1);
        drop(waiter);
        assert_eq!(locks.active_users(), 0);

        let _again = locks.lock(3).await;
        assert_eq!(locks.active_users(), 1);
    }
}
