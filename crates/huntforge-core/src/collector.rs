//! Response collection and merging.
//!
//! The collector is the single consumer of the raw response stream and the
//! only writer to the atlas. Responses for different positions and
//! directions arrive in any order; each one is decoded, classified and
//! merged independently, so out-of-order completion cannot corrupt state.

use crate::ledger::ProbeLedger;
use crate::queue::WorkItem;
use huntforge_atlas::{Atlas, Coordinates, Direction, Hint, HintName};
use huntforge_driver::RawResponse;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Wire shape of one hint batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintBatch {
    pub distance: u32,
    pub pos_x: i32,
    pub pos_y: i32,
    pub pois: Vec<Poi>,
}

/// Wire shape of one point of interest inside a batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub name_id: String,
    pub name: HintName,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    data: Vec<HintBatch>,
}

/// How one response is to be handled.
#[derive(Debug)]
enum Classification {
    /// Challenge page instead of data; retry later, touch nothing.
    Blocked,
    /// A real answer: hint batches, possibly none.
    Resolved(Vec<HintBatch>),
}

/// Single-writer response sink.
///
/// Owns the atlas for the duration of the run and hands it back when the
/// response stream closes.
pub struct Collector {
    atlas: Atlas,
    /// Directions resolved per position this run, as a 4-bit mask. Keeps a
    /// repeated response from counting one direction twice.
    resolved: HashMap<String, u8>,
    retry_tx: mpsc::UnboundedSender<WorkItem>,
    ledger: Arc<ProbeLedger>,
}

impl Collector {
    #[must_use]
    pub fn new(
        atlas: Atlas,
        retry_tx: mpsc::UnboundedSender<WorkItem>,
        ledger: Arc<ProbeLedger>,
    ) -> Self {
        Self {
            atlas,
            resolved: HashMap::new(),
            retry_tx,
            ledger,
        }
    }

    /// Consume the response stream until every sender is gone, then return
    /// the atlas. Retry items are pushed before the ledger is decremented,
    /// so an idle ledger means every retry is already visible.
    pub async fn run(mut self, mut responses: mpsc::Receiver<RawResponse>) -> Atlas {
        while let Some(raw) = responses.recv().await {
            self.absorb(raw);
            self.ledger.finish();
        }
        self.atlas
    }

    /// Decode, classify and merge one raw response.
    pub fn absorb(&mut self, raw: RawResponse) {
        let coordinates = Coordinates::new(raw.x, raw.y);
        let Some(direction) = Direction::from_wire(raw.direction) else {
            tracing::warn!(
                %coordinates,
                wire = raw.direction,
                "response with unknown direction encoding, dropping"
            );
            return;
        };

        match self.classify(&raw, coordinates, direction) {
            Classification::Blocked => {
                tracing::warn!(
                    %coordinates,
                    %direction,
                    "request blocked by the challenge page, queued for retry"
                );
                let _ = self.retry_tx.send(WorkItem::single(coordinates, direction));
            }
            Classification::Resolved(batches) => self.merge(coordinates, direction, batches),
        }
    }

    /// Read access for assertions and reporting.
    #[inline]
    #[must_use]
    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    #[must_use]
    pub fn into_atlas(self) -> Atlas {
        self.atlas
    }

    fn classify(
        &self,
        raw: &RawResponse,
        coordinates: Coordinates,
        direction: Direction,
    ) -> Classification {
        if raw.status == 503 {
            return Classification::Blocked;
        }
        if !raw.ok {
            // typically 404: a valid "nothing in this direction" answer
            return Classification::Resolved(Vec::new());
        }
        let body = raw.body.as_deref().unwrap_or("");
        match serde_json::from_str::<ResponseEnvelope>(body) {
            Ok(envelope) => Classification::Resolved(envelope.data),
            Err(error) => {
                tracing::warn!(
                    %coordinates,
                    %direction,
                    %error,
                    "malformed hint payload, treating as empty"
                );
                Classification::Resolved(Vec::new())
            }
        }
    }

    fn merge(&mut self, coordinates: Coordinates, direction: Direction, batches: Vec<HintBatch>) {
        let key = coordinates.key();
        let bit = 1u8 << direction.index();
        if self
            .resolved
            .get(&key)
            .is_some_and(|mask| mask & bit != 0)
        {
            tracing::debug!(
                %coordinates,
                %direction,
                "direction already resolved this run, dropping duplicate"
            );
            return;
        }

        let mut hints: Vec<Hint> = Vec::new();
        for batch in batches {
            for poi in &batch.pois {
                self.atlas.register_name(&poi.name_id, poi.name.clone());
            }
            let ids = batch.pois.iter().map(|poi| poi.name_id.clone());
            // batches repeating a distance extend the existing line
            match hints.iter_mut().find(|hint| hint.dist == batch.distance) {
                Some(existing) => existing.ids.extend(ids),
                None => hints.push(Hint {
                    dist: batch.distance,
                    x: batch.pos_x,
                    y: batch.pos_y,
                    ids: ids.collect(),
                }),
            }
        }
        self.atlas.write_direction(coordinates, direction, hints);

        let mask = self.resolved.entry(key.clone()).or_insert(0);
        *mask |= bit;
        if *mask == 0b1111 {
            self.resolved.remove(&key);
            let tally = self.atlas.settle_position(coordinates);
            if tally.excluded {
                tracing::info!(%coordinates, "no hints in any direction, excluding position");
            } else {
                tracing::info!(
                    %coordinates,
                    maps = tally.records,
                    hints = tally.ids,
                    "fetched all directions"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;

    fn collector() -> (Collector, mpsc::UnboundedReceiver<WorkItem>) {
        let (retry_tx, retry_rx) = mpsc::unbounded_channel();
        let ledger = Arc::new(ProbeLedger::new());
        (Collector::new(Atlas::new(), retry_tx, ledger), retry_rx)
    }

    fn response(x: i32, y: i32, direction: Direction, status: u16, body: Option<&str>) -> RawResponse {
        RawResponse {
            x,
            y,
            direction: direction.wire(),
            status,
            ok: (200..300).contains(&status),
            body: body.map(ToString::to_string),
        }
    }

    #[test]
    fn unknown_direction_encodings_are_dropped() {
        let (mut collector, mut retry_rx) = collector();
        collector.absorb(RawResponse {
            x: 1,
            y: 1,
            direction: 3,
            status: 200,
            ok: true,
            body: Some(r#"{"data":[]}"#.to_string()),
        });
        assert!(collector.atlas().position("1,1").is_none());
        assert!(matches!(retry_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn duplicate_responses_for_one_direction_are_ignored() {
        let (mut collector, _retry_rx) = collector();
        let body = r#"{"data":[{"distance":1,"posX":2,"posY":1,"pois":[{"nameId":"A","name":{"fr":"Un"}}]}]}"#;
        collector.absorb(response(1, 1, Direction::East, 200, Some(body)));
        collector.absorb(response(1, 1, Direction::East, 200, Some(body)));

        let record = collector.atlas().position("1,1").unwrap();
        let east = record.slot(Direction::East).unwrap();
        assert_eq!(east.len(), 1);
        assert_eq!(east[0].ids, vec!["A".to_string()]);
    }

    #[test]
    fn malformed_bodies_resolve_as_empty() {
        let (mut collector, mut retry_rx) = collector();
        collector.absorb(response(2, 2, Direction::North, 200, Some("<html>")));

        let record = collector.atlas().position("2,2").unwrap();
        assert_eq!(record.slot(Direction::North), Some(&[] as &[Hint]));
        assert!(matches!(retry_rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn missing_data_field_resolves_as_empty() {
        let (mut collector, _retry_rx) = collector();
        collector.absorb(response(2, 2, Direction::South, 200, Some("{}")));
        let record = collector.atlas().position("2,2").unwrap();
        assert_eq!(record.slot(Direction::South), Some(&[] as &[Hint]));
    }
}
