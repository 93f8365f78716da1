//! Work distribution across page sessions.
//!
//! A fixed pool of workers runs concurrently, one page session each. The
//! dispatcher keeps every idle worker fed from the queue, serving retries
//! ahead of fresh positions, and stops on completion, interrupt or the first
//! worker failure.

use crate::error::HuntError;
use crate::ledger::ProbeLedger;
use crate::queue::{WorkItem, WorkQueue};
use huntforge_atlas::{Coordinates, Direction};
use huntforge_driver::{DriverError, HuntPage, PageControls};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Pause briefly like a human operator between UI actions.
async fn jitter_pause(min_ms: u64, max_ms: u64) {
    let ms = { rand::thread_rng().gen_range(min_ms..=max_ms) };
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// One page-driving worker.
///
/// Owns its session and remembers the last position it typed, so moving to a
/// neighbouring position rewrites only the axis that changed.
pub struct Worker {
    id: usize,
    page: Box<dyn HuntPage>,
    controls: PageControls,
    last: Option<Coordinates>,
    ledger: Arc<ProbeLedger>,
    delay_ms: (u64, u64),
}

impl Worker {
    #[must_use]
    pub fn new(
        id: usize,
        page: Box<dyn HuntPage>,
        controls: PageControls,
        ledger: Arc<ProbeLedger>,
        delay_ms: (u64, u64),
    ) -> Self {
        Self {
            id,
            page,
            controls,
            last: None,
            ledger,
            delay_ms,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Type the position and fire the requested probes.
    ///
    /// A full item probes all four directions in slot order; a retry item
    /// probes just its direction.
    pub async fn fetch(&mut self, item: WorkItem) -> Result<(), DriverError> {
        let Coordinates { x, y } = item.coordinates;
        if self.last.map_or(true, |last| last.x != x) {
            self.page
                .set_field(self.controls.field_x, &x.to_string())
                .await?;
        }
        if self.last.map_or(true, |last| last.y != y) {
            self.page
                .set_field(self.controls.field_y, &y.to_string())
                .await?;
        }
        self.pause().await;

        match item.direction {
            Some(direction) => self.probe(direction).await?,
            None => {
                for direction in Direction::ALL {
                    self.probe(direction).await?;
                    self.pause().await;
                }
            }
        }

        self.last = Some(item.coordinates);
        Ok(())
    }

    async fn probe(&mut self, direction: Direction) -> Result<(), DriverError> {
        self.ledger.begin();
        let result = self
            .page
            .click(self.controls.directions[direction.index()])
            .await;
        if result.is_err() {
            // a failed click has no response to wait for
            self.ledger.finish();
        }
        result
    }

    fn pause(&self) -> impl std::future::Future<Output = ()> {
        jitter_pause(self.delay_ms.0, self.delay_ms.1)
    }
}

/// Worker to dispatcher notifications.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Ready for the next item.
    Ready(usize),
    /// A UI action failed irrecoverably.
    Failed { worker: usize, error: DriverError },
}

/// Drive one worker until its item channel closes, then close the session.
pub async fn worker_loop(
    mut worker: Worker,
    mut items: mpsc::Receiver<WorkItem>,
    events: mpsc::Sender<WorkerEvent>,
) {
    let id = worker.id();
    if events.send(WorkerEvent::Ready(id)).await.is_err() {
        return;
    }
    while let Some(item) = items.recv().await {
        tracing::debug!(worker = id, position = %item.coordinates, "fetching");
        match worker.fetch(item).await {
            Ok(()) => {
                if events.send(WorkerEvent::Ready(id)).await.is_err() {
                    break;
                }
            }
            Err(error) => {
                let _ = events.send(WorkerEvent::Failed { worker: id, error }).await;
                break;
            }
        }
    }
    if let Err(error) = worker.page.close().await {
        tracing::debug!(worker = id, %error, "session close reported an error");
    }
}

/// How a dispatch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Queue drained and every response absorbed.
    Completed,
    /// Stopped early on an external interrupt.
    Interrupted,
}

/// Feeds idle workers from the queue until the sweep settles.
///
/// The sweep is settled when the queue is empty, every worker is idle and no
/// probe is in flight; until then late retries can still reopen it.
pub struct Dispatcher {
    queue: WorkQueue,
    retry_rx: mpsc::UnboundedReceiver<WorkItem>,
    item_txs: Vec<mpsc::Sender<WorkItem>>,
    events_rx: mpsc::Receiver<WorkerEvent>,
    idle: Vec<usize>,
    ledger: Arc<ProbeLedger>,
    shutdown: watch::Receiver<bool>,
    retry_open: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        queue: WorkQueue,
        retry_rx: mpsc::UnboundedReceiver<WorkItem>,
        item_txs: Vec<mpsc::Sender<WorkItem>>,
        events_rx: mpsc::Receiver<WorkerEvent>,
        ledger: Arc<ProbeLedger>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            retry_rx,
            item_txs,
            events_rx,
            idle: Vec::new(),
            ledger,
            shutdown,
            retry_open: true,
        }
    }

    pub async fn run(mut self) -> Result<DispatchOutcome, HuntError> {
        loop {
            self.drain_retries();
            self.hand_out().await?;

            if self.settled() {
                tracing::info!("sweep complete");
                return Ok(DispatchOutcome::Completed);
            }
            if *self.shutdown.borrow() {
                return Ok(DispatchOutcome::Interrupted);
            }

            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_ok() && *self.shutdown.borrow() {
                        return Ok(DispatchOutcome::Interrupted);
                    }
                }
                event = self.events_rx.recv() => match event {
                    Some(WorkerEvent::Ready(id)) => self.idle.push(id),
                    Some(WorkerEvent::Failed { worker, error }) => {
                        tracing::error!(worker, %error, "worker failed, shutting the run down");
                        return Err(HuntError::WorkerAction { worker, source: error });
                    }
                    None => return Err(HuntError::WorkersStopped),
                },
                item = self.retry_rx.recv(), if self.retry_open => {
                    match item {
                        Some(item) => self.queue.push_retry(item),
                        None => self.retry_open = false,
                    }
                }
                () = self.ledger.wait_idle(),
                    if self.queue.is_empty() && self.all_idle() => {}
            }
        }
    }

    fn drain_retries(&mut self) {
        while let Ok(item) = self.retry_rx.try_recv() {
            self.queue.push_retry(item);
        }
    }

    async fn hand_out(&mut self) -> Result<(), HuntError> {
        while !self.idle.is_empty() && !self.queue.is_empty() {
            let (Some(id), Some(item)) = (self.idle.pop(), self.queue.pop()) else {
                break;
            };
            if self.item_txs[id].send(item).await.is_err() {
                return Err(HuntError::WorkersStopped);
            }
        }
        Ok(())
    }

    fn settled(&self) -> bool {
        self.queue.is_empty() && self.all_idle() && self.ledger.is_idle()
    }

    fn all_idle(&self) -> bool {
        self.idle.len() == self.item_txs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huntforge_driver::{HuntBrowser, SimBrowser, SimWorld};

    async fn sim_worker(world: &SimWorld, ledger: Arc<ProbeLedger>) -> Worker {
        let (tx, rx) = mpsc::channel(64);
        // responses are not inspected here
        tokio::spawn(async move {
            let mut rx = rx;
            while rx.recv().await.is_some() {}
        });
        let mut browser = SimBrowser::new(world.clone()).with_latency(0, 1);
        let mut page = browser
            .open_page(tx)
            .await
            .expect("sim page always opens");
        let controls = page.locate_controls().await.expect("sim page is intact");
        Worker::new(0, page, controls, ledger, (0, 0))
    }

    #[tokio::test]
    async fn full_items_probe_all_four_directions() {
        let world = SimWorld::new();
        let ledger = Arc::new(ProbeLedger::new());
        let mut worker = sim_worker(&world, ledger).await;

        worker
            .fetch(WorkItem::full(Coordinates::new(2, 3)))
            .await
            .unwrap();
        assert_eq!(world.probe_count(), 4);
        assert_eq!(world.field_write_count(), 2);
    }

    #[tokio::test]
    async fn moving_along_one_axis_rewrites_only_that_field() {
        let world = SimWorld::new();
        let ledger = Arc::new(ProbeLedger::new());
        let mut worker = sim_worker(&world, ledger).await;

        worker
            .fetch(WorkItem::full(Coordinates::new(5, 5)))
            .await
            .unwrap();
        worker
            .fetch(WorkItem::full(Coordinates::new(5, 6)))
            .await
            .unwrap();
        // two writes for the first position, one for the changed y
        assert_eq!(world.field_write_count(), 3);
    }

    #[tokio::test]
    async fn retry_items_probe_a_single_direction() {
        let world = SimWorld::new();
        let ledger = Arc::new(ProbeLedger::new());
        let mut worker = sim_worker(&world, ledger).await;

        worker
            .fetch(WorkItem::single(Coordinates::new(1, 1), Direction::West))
            .await
            .unwrap();
        assert_eq!(world.probe_count(), 1);
    }

    #[tokio::test]
    async fn action_failures_surface_as_driver_errors() {
        let world = SimWorld::new();
        world.break_position(Coordinates::new(4, 4));
        let ledger = Arc::new(ProbeLedger::new());
        let mut worker = sim_worker(&world, ledger).await;

        let result = worker.fetch(WorkItem::full(Coordinates::new(4, 4))).await;
        assert!(matches!(result, Err(DriverError::Action(_))));
    }
}
