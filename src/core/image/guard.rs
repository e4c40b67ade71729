// Per-user "one generation at a time" guard.
//
// A second request from a user who already has one in flight is rejected, never
// queued. The slot is freed when the guard drops, which covers success, errors,
// early returns and panics alike.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct GenerationLocks {
    active: Arc<DashMap<u64, ()>>,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the user's slot, or `None` if they are already generating.
    pub fn try_acquire(&self, user_id: u64) -> Option<GenerationGuard> {
        match self.active.entry(user_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(GenerationGuard {
                    active: Arc::clone(&self.active),
                    user_id,
                })
            }
        }
    }

    pub fn is_generating(&self, user_id: u64) -> bool {
        self.active.contains_key(&user_id)
    }
}

#[derive(Debug)]
pub struct GenerationGuard {
    active: Arc<DashMap<u64, ()>>,
    user_id: u64,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.active.remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected() {
        let locks = GenerationLocks::new();
        let guard = locks.try_acquire(1).unwrap();
        assert!(locks.try_acquire(1).is_none());
        assert!(locks.is_generating(1));

        // Other users are independent
        assert!(locks.try_acquire(2).is_some());

        drop(guard);
        assert!(!locks.is_generating(1));
        assert!(locks.try_acquire(1).is_some());
    }

    #[tokio::test]
    async fn test_released_when_task_fails() {
        let locks = GenerationLocks::new();
        let task_locks = locks.clone();

        let result = tokio::spawn(async move {
            let _guard = task_locks.try_acquire(9).unwrap();
            Err::<(), &str>("backend exploded")
        })
        .await
        .unwrap();

        assert!(result.is_err());
        assert!(!locks.is_generating(9));
    }

    #[tokio::test]
    async fn test_released_on_panic() {
        let locks = GenerationLocks::new();
        let task_locks = locks.clone();

        let joined = tokio::spawn(async move {
            let _guard = task_locks.try_acquire(3).unwrap();
            panic!("boom");
        })
        .await;

        assert!(joined.is_err());
        assert!(!locks.is_generating(3));
    }
}
