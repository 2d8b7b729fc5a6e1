//! Cancellation and deadline scope threaded through every store and provider call.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a scoped call was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A cancellable, deadline-bearing request scope.
///
/// Contexts are cheap to clone. A child context is canceled together with its
/// parent and can only shorten the parent's deadline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl RequestContext {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context canceled whenever `parent` is.
    pub fn from_token(parent: &CancellationToken) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: None,
        }
    }

    /// Derive a child whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The reason this context is no longer usable, if any.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.is_cancelled() {
            return Some(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Drive `fut` to completion unless the context is canceled or its
    /// deadline passes first. The abandoned future is dropped.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<ContextError>,
    {
        if let Some(err) = self.err() {
            return Err(err.into());
        }

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ContextError::Canceled.into()),
            _ = expired => Err(ContextError::DeadlineExceeded.into()),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Context(ContextError),
    }

    impl From<ContextError> for TestError {
        fn from(err: ContextError) -> Self {
            TestError::Context(err)
        }
    }

    #[tokio::test]
    async fn test_run_completes_without_deadline() {
        let ctx = RequestContext::background();
        let result: Result<u32, TestError> = ctx.run(async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_canceled_context_short_circuits() {
        let ctx = RequestContext::background();
        ctx.cancel();
        let result: Result<(), TestError> = ctx.run(async { Ok(()) }).await;
        assert_eq!(result, Err(TestError::Context(ContextError::Canceled)));
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_child() {
        let parent = CancellationToken::new();
        let ctx = RequestContext::from_token(&parent).with_timeout(Duration::from_secs(60));

        let handle = tokio::spawn({
            let ctx = ctx.clone();
            async move {
                ctx.run(std::future::pending::<Result<(), TestError>>())
                    .await
            }
        });
        parent.cancel();

        let result = handle.await.unwrap();
        assert_eq!(result, Err(TestError::Context(ContextError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));
        let result: Result<(), TestError> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_eq!(
            result,
            Err(TestError::Context(ContextError::DeadlineExceeded))
        );
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_cannot_extend_deadline() {
        let parent = RequestContext::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());

        let shorter = parent.with_timeout(Duration::from_millis(10));
        assert!(shorter.deadline() < parent.deadline());
    }
}
