use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use super::Reason;

/// A bounded-concurrency permit pool.
///
/// At most `max_permits` calls hold a permit at any instant. Acquisition
/// waits up to the configured timeout for a permit to free; a zero timeout
/// means try-once with no waiting. This is the only suspension point in the
/// crate, and it is always timeout-bounded.
///
/// The permit returned by [`acquire`](PermitPool::acquire) releases itself
/// when dropped, so it returns to the pool on every exit path: normal
/// completion, an error, a panic unwinding through the caller, or
/// cancellation of the future holding it. Releasing without a matching
/// acquisition is unrepresentable.
#[derive(Debug)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl PermitPool {
    /// Creates a new `PermitPool`.
    ///
    /// # Arguments
    ///
    /// * `max_permits` - The number of calls allowed in flight at once.
    /// * `acquire_timeout` - How long a caller may wait for a free permit.
    pub fn new(max_permits: NonZeroUsize, acquire_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_permits.get())),
            acquire_timeout,
        }
    }

    /// Attempts to take one permit, waiting up to the pool's timeout.
    pub async fn acquire(&self) -> ControlFlow<Reason, OwnedSemaphorePermit> {
        if self.acquire_timeout.is_zero() {
            match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => ControlFlow::Continue(permit),
                Err(_) => ControlFlow::Break(Reason::AcquireTimeout),
            }
        } else {
            match timeout(
                self.acquire_timeout,
                Arc::clone(&self.semaphore).acquire_owned(),
            )
            .await
            {
                Ok(Ok(permit)) => ControlFlow::Continue(permit),
                // The semaphore is never closed; treat it like a timeout
                // rather than poisoning the caller.
                Ok(Err(_)) | Err(_) => ControlFlow::Break(Reason::AcquireTimeout),
            }
        }
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_timeout_rejects_immediately_when_held() {
        let pool = PermitPool::new(NonZeroUsize::new(1).unwrap(), Duration::ZERO);

        let held = pool.acquire().await;
        assert!(held.is_continue());

        // Second acquire must not wait at all
        assert!(matches!(
            pool.acquire().await,
            ControlFlow::Break(Reason::AcquireTimeout)
        ));

        // Dropping the permit frees the pool for the next caller
        drop(held);
        assert!(pool.acquire().await.is_continue());
    }

    #[tokio::test]
    async fn waiting_acquire_succeeds_once_a_permit_frees() {
        let pool = Arc::new(PermitPool::new(
            NonZeroUsize::new(1).unwrap(),
            Duration::from_millis(200),
        ));

        let held = pool.acquire().await;
        assert!(held.is_continue());

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.is_continue() })
        };

        // Give the waiter time to park, then free the permit
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_acquire_times_out() {
        let pool = Arc::new(PermitPool::new(
            NonZeroUsize::new(1).unwrap(),
            Duration::from_millis(50),
        ));

        let _held = pool.acquire().await;

        // Paused clock: the timeout elapses deterministically
        assert!(matches!(
            pool.acquire().await,
            ControlFlow::Break(Reason::AcquireTimeout)
        ));
    }

    #[tokio::test]
    async fn cancellation_does_not_leak_a_permit() {
        let pool = Arc::new(PermitPool::new(
            NonZeroUsize::new(1).unwrap(),
            Duration::from_secs(5),
        ));

        let held = pool.acquire().await;
        assert!(held.is_continue());

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _ = pool.acquire().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter.abort();
        let _ = waiter.await;

        drop(held);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn outstanding_permits_never_exceed_the_maximum() {
        let max = 4;
        let pool = Arc::new(PermitPool::new(
            NonZeroUsize::new(max).unwrap(),
            Duration::ZERO,
        ));

        let mut handles = vec![];
        for _ in 0..20 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move { pool.acquire().await }));
        }

        let results = futures::future::join_all(handles).await;
        let held: Vec<_> = results
            .into_iter()
            .filter_map(|r| match r.unwrap() {
                ControlFlow::Continue(permit) => Some(permit),
                ControlFlow::Break(_) => None,
            })
            .collect();

        assert_eq!(held.len(), max);
        assert_eq!(pool.available(), 0);

        drop(held);
        assert_eq!(pool.available(), max);
    }
}
