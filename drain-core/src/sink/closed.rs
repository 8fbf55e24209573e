use tokio_util::sync::CancellationToken;

/// One-shot close latch shared by every sink in this crate.
///
/// Wraps a [`CancellationToken`] to provide the three pieces of the closed
/// contract in one place: tripping the latch (at most once takes effect),
/// the non-blocking [`CloseLatch::is_closed`] predicate, and the awaitable
/// [`CloseLatch::closed`] future for use inside `tokio::select!`.
#[derive(Clone, Default)]
pub struct CloseLatch {
    token: CancellationToken,
}

impl CloseLatch {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Trips the latch. Repeated calls are no-ops.
    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the latch has been tripped.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }

    /// A token consumers can hold to observe the close independently of the
    /// sink's lifetime.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trips_exactly_once() {
        let latch = CloseLatch::new();
        assert!(!latch.is_closed());

        latch.close();
        assert!(latch.is_closed());

        // second trip is a no-op
        latch.close();
        assert!(latch.is_closed());

        // already-tripped latch completes immediately
        latch.closed().await;
    }

    #[tokio::test]
    async fn wakes_waiters() {
        let latch = CloseLatch::new();
        let waiter = latch.clone();

        let handle = tokio::spawn(async move { waiter.closed().await });
        latch.close();
        handle.await.expect("waiter should complete");
    }
}
