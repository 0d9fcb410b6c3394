use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

use crate::models::{ProfileId, ProfileKind};

type LockKey = (ProfileKind, ProfileId);

/// Per-profile async locks serialising read-modify-write cycles.
///
/// Only weak references are kept, so a profile's lock is dropped as soon as
/// no task holds or waits on it.
#[derive(Debug, Default)]
pub struct ProfileLocks {
    locks: Mutex<HashMap<LockKey, Weak<TokioMutex<()>>>>,
}

impl ProfileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one profile
    pub async fn acquire(&self, kind: ProfileKind, id: &ProfileId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, weak| weak.strong_count() > 0);

            let key = (kind, id.clone());
            match locks.get(&key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(TokioMutex::new(()));
                    locks.insert(key, Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of profiles with a live lock
    pub fn active(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
