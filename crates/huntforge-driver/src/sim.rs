//! Scripted in-memory hunt page.
//!
//! Stands in for a live browser session: a shared [`SimWorld`] scripts what
//! the hint endpoint answers per (position, direction), and every opened
//! [`SimBrowser`] page replays that script with a small settle delay. Used by
//! the test suites and the CLI's rehearsal backend.

use crate::api::{
    pick_user_agent, ControlId, DriverError, HuntBrowser, HuntPage, PageControls, RawResponse,
};
use async_trait::async_trait;
use huntforge_atlas::{Coordinates, Direction};
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const FIELD_X: ControlId = ControlId(0);
const FIELD_Y: ControlId = ControlId(1);
const DIRECTION_CONTROLS: [ControlId; 4] = [ControlId(2), ControlId(3), ControlId(4), ControlId(5)];

/// One point of interest inside a scripted batch.
#[derive(Debug, Clone)]
pub struct ScriptedPoi {
    pub name_id: String,
    pub label: String,
}

impl ScriptedPoi {
    #[must_use]
    pub fn new(name_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name_id: name_id.into(),
            label: label.into(),
        }
    }
}

/// One hint batch as the endpoint would deliver it.
#[derive(Debug, Clone)]
pub struct ScriptedBatch {
    pub distance: u32,
    pub pos_x: i32,
    pub pos_y: i32,
    pub pois: Vec<ScriptedPoi>,
}

impl ScriptedBatch {
    #[must_use]
    pub fn new(distance: u32, pos_x: i32, pos_y: i32, pois: Vec<ScriptedPoi>) -> Self {
        Self {
            distance,
            pos_x,
            pos_y,
            pois,
        }
    }
}

/// What the scripted endpoint answers for one probe.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// 200 with hint batches.
    Hints(Vec<ScriptedBatch>),
    /// 404, the valid "nothing in this direction" answer.
    NoHints,
    /// 503 challenge page.
    Blocked,
    /// 200 with a body the decoder will choke on.
    Garbage,
}

#[derive(Debug, Default)]
struct WorldState {
    /// Outcome sequences per (position key, direction), consumed in push
    /// order; the last entry repeats once the rest are drained.
    script: HashMap<(String, Direction), Vec<ScriptedOutcome>>,
    /// Report this many fields/directions instead of the expected 2/4.
    structural_mismatch: Option<(usize, usize)>,
    /// Positions whose UI actions fail hard.
    broken_positions: HashSet<String>,
    field_writes: u64,
    probes: u64,
}

/// Shared scripted world behind every sim session.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    state: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one outcome for a (position, direction). Outcomes are consumed
    /// in push order; the final one repeats forever. Unscripted probes
    /// answer [`ScriptedOutcome::NoHints`].
    pub fn push_outcome(
        &self,
        coordinates: Coordinates,
        direction: Direction,
        outcome: ScriptedOutcome,
    ) {
        self.state
            .lock()
            .script
            .entry((coordinates.key(), direction))
            .or_default()
            .push(outcome);
    }

    /// Shorthand for a successful probe with hint batches.
    pub fn hints(&self, coordinates: Coordinates, direction: Direction, batches: Vec<ScriptedBatch>) {
        self.push_outcome(coordinates, direction, ScriptedOutcome::Hints(batches));
    }

    /// Make `locate_controls` report a broken page.
    pub fn break_page_structure(&self, fields: usize, directions: usize) {
        self.state.lock().structural_mismatch = Some((fields, directions));
    }

    /// Make every UI click at `coordinates` fail hard.
    pub fn break_position(&self, coordinates: Coordinates) {
        self.state.lock().broken_positions.insert(coordinates.key());
    }

    /// Number of field writes across all sessions so far.
    #[must_use]
    pub fn field_write_count(&self) -> u64 {
        self.state.lock().field_writes
    }

    /// Number of direction probes across all sessions so far.
    #[must_use]
    pub fn probe_count(&self) -> u64 {
        self.state.lock().probes
    }

    fn resolve(&self, coordinates: Coordinates, direction: Direction) -> ScriptedOutcome {
        let mut state = self.state.lock();
        state.probes += 1;
        let key = (coordinates.key(), direction);
        match state.script.get_mut(&key) {
            Some(sequence) if sequence.len() > 1 => sequence.remove(0),
            Some(sequence) => sequence
                .first()
                .cloned()
                .unwrap_or(ScriptedOutcome::NoHints),
            None => ScriptedOutcome::NoHints,
        }
    }
}

/// Browser factory for scripted pages.
pub struct SimBrowser {
    world: SimWorld,
    latency_ms: (u64, u64),
}

impl SimBrowser {
    #[must_use]
    pub fn new(world: SimWorld) -> Self {
        Self {
            world,
            latency_ms: (1, 5),
        }
    }

    /// Backend entry point used by the CLI. The scripted page has no real
    /// browser process, so the launch options are only logged.
    #[must_use]
    pub fn connect(options: &crate::api::LaunchOptions, world: SimWorld) -> Self {
        tracing::info!(
            headless = options.headless,
            args = options.args.len(),
            "scripted browser ready, launch options have no effect here"
        );
        Self::new(world)
    }

    /// Settle delay range applied to every probe.
    #[must_use]
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms, max_ms);
        self
    }
}

#[async_trait]
impl HuntBrowser for SimBrowser {
    async fn open_page(
        &mut self,
        responses: mpsc::Sender<RawResponse>,
    ) -> Result<Box<dyn HuntPage>, DriverError> {
        let user_agent = pick_user_agent();
        tracing::debug!(user_agent, "scripted page opened");
        Ok(Box::new(SimPage {
            world: self.world.clone(),
            responses,
            fields: [String::new(), String::new()],
            latency_ms: self.latency_ms,
            closed: false,
        }))
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

struct SimPage {
    world: SimWorld,
    responses: mpsc::Sender<RawResponse>,
    fields: [String; 2],
    latency_ms: (u64, u64),
    closed: bool,
}

impl SimPage {
    fn position(&self) -> Result<Coordinates, DriverError> {
        let x = self.fields[0]
            .parse()
            .map_err(|_| DriverError::Action("x field does not hold a number".to_string()))?;
        let y = self.fields[1]
            .parse()
            .map_err(|_| DriverError::Action("y field does not hold a number".to_string()))?;
        Ok(Coordinates::new(x, y))
    }

    async fn settle(&self) {
        let (min, max) = self.latency_ms;
        let ms = { rand::thread_rng().gen_range(min..=max) };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl HuntPage for SimPage {
    async fn locate_controls(&mut self) -> Result<PageControls, DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed);
        }
        if let Some((fields, directions)) = self.world.state.lock().structural_mismatch {
            return Err(DriverError::StructuralMismatch { fields, directions });
        }
        Ok(PageControls {
            field_x: FIELD_X,
            field_y: FIELD_Y,
            directions: DIRECTION_CONTROLS,
        })
    }

    async fn set_field(&mut self, control: ControlId, value: &str) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed);
        }
        let slot = match control {
            FIELD_X => 0,
            FIELD_Y => 1,
            other => {
                return Err(DriverError::Action(format!(
                    "control {other:?} is not a text field"
                )))
            }
        };
        self.fields[slot] = value.to_string();
        self.world.state.lock().field_writes += 1;
        Ok(())
    }

    async fn click(&mut self, control: ControlId) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed);
        }
        let Some(slot) = DIRECTION_CONTROLS.iter().position(|c| *c == control) else {
            return Err(DriverError::Action(format!(
                "control {control:?} is not a direction button"
            )));
        };
        let direction = Direction::ALL[slot];
        let coordinates = self.position()?;
        if self
            .world
            .state
            .lock()
            .broken_positions
            .contains(&coordinates.key())
        {
            return Err(DriverError::Action(format!(
                "page stopped responding at {coordinates}"
            )));
        }

        let outcome = self.world.resolve(coordinates, direction);
        self.settle().await;

        let response = match outcome {
            ScriptedOutcome::Hints(batches) => RawResponse {
                x: coordinates.x,
                y: coordinates.y,
                direction: direction.wire(),
                status: 200,
                ok: true,
                body: Some(encode_body(&batches)),
            },
            ScriptedOutcome::Garbage => RawResponse {
                x: coordinates.x,
                y: coordinates.y,
                direction: direction.wire(),
                status: 200,
                ok: true,
                body: Some("<!doctype html><title>maintenance</title>".to_string()),
            },
            ScriptedOutcome::NoHints => RawResponse {
                x: coordinates.x,
                y: coordinates.y,
                direction: direction.wire(),
                status: 404,
                ok: false,
                body: None,
            },
            ScriptedOutcome::Blocked => RawResponse {
                x: coordinates.x,
                y: coordinates.y,
                direction: direction.wire(),
                status: 503,
                ok: false,
                body: None,
            },
        };

        self.responses
            .send(response)
            .await
            .map_err(|_| DriverError::SessionClosed)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.closed = true;
        Ok(())
    }
}

fn encode_body(batches: &[ScriptedBatch]) -> String {
    let data: Vec<_> = batches
        .iter()
        .map(|batch| {
            let pois: Vec<_> = batch
                .pois
                .iter()
                .map(|poi| {
                    json!({
                        "nameId": poi.name_id,
                        "name": { "id": poi.name_id, "fr": poi.label, "en": poi.label },
                    })
                })
                .collect();
            json!({
                "distance": batch.distance,
                "posX": batch.pos_x,
                "posY": batch.pos_y,
                "pois": pois,
            })
        })
        .collect();
    json!({ "data": data }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(world: &SimWorld) -> (Box<dyn HuntPage>, mpsc::Receiver<RawResponse>) {
        let (tx, rx) = mpsc::channel(16);
        let mut browser = SimBrowser::new(world.clone()).with_latency(0, 1);
        let page = browser.open_page(tx).await.unwrap();
        (page, rx)
    }

    async fn probe(
        page: &mut Box<dyn HuntPage>,
        controls: &PageControls,
        direction: Direction,
    ) -> Result<(), DriverError> {
        page.click(controls.directions[direction.index()]).await
    }

    #[tokio::test]
    async fn unscripted_probes_answer_not_found() {
        let world = SimWorld::new();
        let (mut page, mut rx) = open(&world).await;
        let controls = page.locate_controls().await.unwrap();

        page.set_field(controls.field_x, "3").await.unwrap();
        page.set_field(controls.field_y, "-2").await.unwrap();
        probe(&mut page, &controls, Direction::East).await.unwrap();

        let response = rx.recv().await.unwrap();
        assert_eq!((response.x, response.y), (3, -2));
        assert_eq!(response.direction, Direction::East.wire());
        assert_eq!(response.status, 404);
        assert!(!response.ok);
    }

    #[tokio::test]
    async fn scripted_outcomes_are_consumed_in_order() {
        let world = SimWorld::new();
        let c = Coordinates::new(1, 1);
        world.push_outcome(c, Direction::North, ScriptedOutcome::Blocked);
        world.push_outcome(
            c,
            Direction::North,
            ScriptedOutcome::Hints(vec![ScriptedBatch::new(
                2,
                1,
                3,
                vec![ScriptedPoi::new("7", "Statue")],
            )]),
        );

        let (mut page, mut rx) = open(&world).await;
        let controls = page.locate_controls().await.unwrap();
        page.set_field(controls.field_x, "1").await.unwrap();
        page.set_field(controls.field_y, "1").await.unwrap();

        probe(&mut page, &controls, Direction::North).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().status, 503);

        probe(&mut page, &controls, Direction::North).await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second.status, 200);
        assert!(second.body.unwrap().contains("Statue"));

        // last outcome repeats
        probe(&mut page, &controls, Direction::North).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn broken_structure_fails_control_lookup() {
        let world = SimWorld::new();
        world.break_page_structure(3, 0);
        let (mut page, _rx) = open(&world).await;
        match page.locate_controls().await {
            Err(DriverError::StructuralMismatch { fields, directions }) => {
                assert_eq!((fields, directions), (3, 0));
            }
            other => panic!("expected StructuralMismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clicking_before_typing_a_position_fails() {
        let world = SimWorld::new();
        let (mut page, _rx) = open(&world).await;
        let controls = page.locate_controls().await.unwrap();
        let result = probe(&mut page, &controls, Direction::South).await;
        assert!(matches!(result, Err(DriverError::Action(_))));
    }

    #[tokio::test]
    async fn broken_positions_fail_the_click() {
        let world = SimWorld::new();
        world.break_position(Coordinates::new(0, 1));
        let (mut page, _rx) = open(&world).await;
        let controls = page.locate_controls().await.unwrap();
        page.set_field(controls.field_x, "0").await.unwrap();
        page.set_field(controls.field_y, "1").await.unwrap();
        let result = probe(&mut page, &controls, Direction::West).await;
        assert!(matches!(result, Err(DriverError::Action(_))));
    }

    #[tokio::test]
    async fn closed_sessions_refuse_actions() {
        let world = SimWorld::new();
        let (mut page, _rx) = open(&world).await;
        let controls = page.locate_controls().await.unwrap();
        page.close().await.unwrap();
        let result = page.set_field(controls.field_x, "1").await;
        assert!(matches!(result, Err(DriverError::SessionClosed)));
    }
}
