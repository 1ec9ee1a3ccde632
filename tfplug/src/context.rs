//! Request-scoped cancellation
//!
//! Cancellation is advisory. Operations check it before they start doing
//! remote work; nothing already sent to a remote API is rolled back.

use std::sync::Arc;
use tokio::sync::watch;

/// Context is passed as the first parameter to every async trait method.
/// Clones share one cancellation flag.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner { done, done_tx }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_seen_by_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());

        ctx.cancel();

        assert!(ctx.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn fresh_contexts_are_independent() {
        let first = Context::new();
        first.cancel();
        assert!(!Context::default().is_cancelled());
    }
}
