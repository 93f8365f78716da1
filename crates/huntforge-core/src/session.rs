//! Run lifecycle: startup ordering, interrupt handling, drain and save.

use crate::collector::Collector;
use crate::config::Config;
use crate::dispatch::{worker_loop, DispatchOutcome, Dispatcher, Worker, WorkerEvent};
use crate::error::HuntError;
use crate::ledger::ProbeLedger;
use crate::queue::{WorkItem, WorkQueue};
use futures::future;
use huntforge_atlas::{snapshot, Atlas};
use huntforge_driver::{HuntBrowser, RawResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Buffered responses before page sessions back-pressure.
const RESPONSE_BUFFER: usize = 64;

/// How long shutdown waits for in-flight responses before saving anyway.
/// A probe whose response never arrives must not hang the save path.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Interrupt gate. The first trigger starts the drain; any further trigger
/// is acknowledged and ignored, so a second interrupt cannot re-enter the
/// save path.
#[derive(Debug)]
pub struct Shutdown {
    engaged: AtomicBool,
    tx: watch::Sender<bool>,
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            engaged: AtomicBool::new(false),
            tx,
        }
    }

    /// Returns true on the first trigger only.
    pub fn trigger(&self) -> bool {
        let first = !self.engaged.swap(true, Ordering::SeqCst);
        if first {
            let _ = self.tx.send(true);
        }
        first
    }

    #[inline]
    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How the run ended plus what the atlas now holds.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub outcome: DispatchOutcome,
    pub positions: usize,
    pub names: usize,
    pub excluded: usize,
    pub saved: bool,
}

/// One full collection run against a browser backend.
pub struct Session {
    config: Config,
}

impl Session {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Execute the run end to end: hook interrupts, open the sessions, sweep
    /// the bounds, drain in-flight responses and save.
    ///
    /// Any exit path, including fatal errors, drains and saves before this
    /// returns. The interrupt hook is installed before the browser acquires
    /// resources.
    pub async fn run(
        self,
        browser: Box<dyn HuntBrowser>,
        atlas: Atlas,
    ) -> Result<RunReport, HuntError> {
        let shutdown = Arc::new(Shutdown::new());
        spawn_interrupt_hook(shutdown.clone());
        self.run_with_shutdown(browser, atlas, shutdown).await
    }

    /// [`run`](Session::run) with an externally owned interrupt gate.
    pub async fn run_with_shutdown(
        self,
        mut browser: Box<dyn HuntBrowser>,
        atlas: Atlas,
        shutdown: Arc<Shutdown>,
    ) -> Result<RunReport, HuntError> {
        let config = self.config;
        let queue = if config.manual {
            WorkQueue::default()
        } else {
            WorkQueue::build(&config.bounds, &atlas)
        };

        let ledger = Arc::new(ProbeLedger::new());
        let (response_tx, response_rx) = mpsc::channel::<RawResponse>(RESPONSE_BUFFER);
        let (retry_tx, retry_rx) = mpsc::unbounded_channel::<WorkItem>();
        let collector = Collector::new(atlas, retry_tx, ledger.clone());
        let collector_task = tokio::spawn(collector.run(response_rx));

        let (events_tx, events_rx) = mpsc::channel::<WorkerEvent>(config.instances.max(1));
        let mut item_txs = Vec::with_capacity(config.instances);
        let mut worker_tasks = Vec::with_capacity(config.instances);
        let mut startup_error = None;
        for id in 0..config.instances {
            match open_worker(
                browser.as_mut(),
                id,
                &config,
                ledger.clone(),
                response_tx.clone(),
            )
            .await
            {
                Ok(worker) => {
                    let (tx, rx) = mpsc::channel::<WorkItem>(1);
                    item_txs.push(tx);
                    worker_tasks.push(tokio::spawn(worker_loop(worker, rx, events_tx.clone())));
                }
                Err(error) => {
                    startup_error = Some(error);
                    break;
                }
            }
        }
        drop(response_tx);
        drop(events_tx);

        let inner = if let Some(error) = startup_error {
            drop(item_txs);
            Err(error)
        } else if config.manual {
            tracing::info!("manual mode: observing responses until interrupted");
            let mut engaged = shutdown.watch();
            let _ = engaged.wait_for(|on| *on).await;
            drop(item_txs);
            Ok(DispatchOutcome::Interrupted)
        } else {
            let dispatcher = Dispatcher::new(
                queue,
                retry_rx,
                item_txs,
                events_rx,
                ledger.clone(),
                shutdown.watch(),
            );
            dispatcher.run().await
        };

        if let Err(error) = &inner {
            tracing::error!(%error, "run aborted, draining before save");
        }

        // item channels are gone: workers finish their current item, close
        // their pages and drop the response senders
        let _ = future::join_all(worker_tasks).await;

        if tokio::time::timeout(DRAIN_TIMEOUT, ledger.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                in_flight = ledger.in_flight(),
                "probes still unanswered after drain timeout, saving anyway"
            );
        }

        if let Err(error) = browser.disconnect().await {
            tracing::debug!(%error, "browser disconnect reported an error");
        }
        let atlas = collector_task
            .await
            .map_err(|error| HuntError::Internal(error.to_string()))?;

        let saved = if atlas.has_new_data() {
            snapshot::save(&config.output_save_path, &atlas)?;
            true
        } else {
            tracing::info!("nothing new to save");
            false
        };

        let outcome = inner?;
        Ok(RunReport {
            outcome,
            positions: atlas.position_count(),
            names: atlas.name_count(),
            excluded: atlas.excluded_count(),
            saved,
        })
    }
}

async fn open_worker(
    browser: &mut dyn HuntBrowser,
    id: usize,
    config: &Config,
    ledger: Arc<ProbeLedger>,
    responses: mpsc::Sender<RawResponse>,
) -> Result<Worker, HuntError> {
    let mut page = browser.open_page(responses).await?;
    let controls = page.locate_controls().await?;
    tracing::info!(worker = id, "instance ready");
    Ok(Worker::new(
        id,
        page,
        controls,
        ledger,
        config.action_delay_ms,
    ))
}

/// Listen for interrupts for the lifetime of the process. Registered before
/// any browser resource exists so an early interrupt still drains cleanly.
fn spawn_interrupt_hook(shutdown: Arc<Shutdown>) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if shutdown.trigger() {
                tracing::warn!("interrupt received, draining in-flight work and saving");
            } else {
                tracing::warn!("shutdown already in progress");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_triggers_exactly_once() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_engaged());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_engaged());
    }

    #[tokio::test]
    async fn shutdown_watchers_observe_the_trigger() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.watch();
        assert!(!*rx.borrow());
        shutdown.trigger();
        rx.wait_for(|on| *on).await.unwrap();
    }
}
