//! In-flight probe accounting.

use tokio::sync::watch;

/// Counts probes whose responses have not been absorbed yet.
///
/// Workers call [`begin`](ProbeLedger::begin) when a probe leaves for the
/// endpoint; the collector calls [`finish`](ProbeLedger::finish) once the
/// matching response is fully classified. Shutdown waits on
/// [`wait_idle`](ProbeLedger::wait_idle) so in-flight answers are neither
/// lost nor double counted.
#[derive(Debug)]
pub struct ProbeLedger {
    count: watch::Sender<usize>,
}

impl ProbeLedger {
    #[must_use]
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    /// A probe left for the endpoint.
    #[inline]
    pub fn begin(&self) {
        self.count.send_modify(|n| *n += 1);
    }

    /// A response has been fully absorbed.
    #[inline]
    pub fn finish(&self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }

    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.count.borrow()
    }

    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Resolve once no probe is in flight; immediately if already idle.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for ProbeLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn counts_balance_out() {
        let ledger = ProbeLedger::new();
        assert!(ledger.is_idle());
        ledger.begin();
        ledger.begin();
        assert_eq!(ledger.in_flight(), 2);
        ledger.finish();
        ledger.finish();
        assert!(ledger.is_idle());
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let ledger = ProbeLedger::new();
        tokio::time::timeout(Duration::from_millis(50), ledger.wait_idle())
            .await
            .expect("idle ledger must not block");
    }

    #[tokio::test]
    async fn wait_idle_blocks_until_the_last_finish() {
        let ledger = Arc::new(ProbeLedger::new());
        ledger.begin();

        let waiter = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.wait_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        ledger.finish();
        tokio::time::timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter must resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn finish_never_underflows() {
        let ledger = ProbeLedger::new();
        ledger.finish();
        assert!(ledger.is_idle());
    }
}
