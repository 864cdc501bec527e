use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-order async mutexes. Receive and Cancel hold one for the length of their transaction
/// so two callers never interleave writes against the same order in this process.
///
/// The guard is taken before the transaction opens and released after it ends, so a waiter
/// never sits on a pooled connection. Cross-process serialization is the order row lock.
///
/// Entries are dropped once the last holder or waiter lets go.
#[derive(Clone, Default)]
pub struct OrderLocks {
    inner: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, order_id: i64) -> OrderLockGuard {
        let mutex = self
            .inner
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        OrderLockGuard {
            order_id,
            registry: Arc::clone(&self.inner),
            guard: Some(mutex.lock_owned().await),
        }
    }

    /// Orders with a holder or a waiter right now.
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for OrderLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderLocks")
            .field("active", &self.active())
            .finish()
    }
}

pub struct OrderLockGuard {
    order_id: i64,
    registry: Arc<DashMap<i64, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderLockGuard {
    pub fn order_id(&self) -> i64 {
        self.order_id
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry
            .remove_if(&self.order_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn registry_empties_after_release() {
        let locks = OrderLocks::new();
        {
            let guard = locks.acquire(7).await;
            assert_eq!(guard.order_id(), 7);
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn same_order_is_serialized() {
        let locks = OrderLocks::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_inside = max_inside.clone();
                tokio::spawn(async move {
                    let _guard = locks.acquire(1).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_orders_do_not_block_each_other() {
        let locks = OrderLocks::new();
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(b.is_ok());
    }
}
