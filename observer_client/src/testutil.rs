//! Test doubles shared by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use observer_shared::{
    error::TransportError,
    net::{Reply, Transport},
    proto::{Action, Layer, Status},
};
use serde_json::{json, Value};

/// Counters and failure switches shared with a [`MockTransport`].
#[derive(Clone)]
pub struct MockHandle {
    turn_fetches: Arc<AtomicUsize>,
    failing_turns: Arc<Mutex<HashSet<u32>>>,
}

impl MockHandle {
    /// Number of TURN requests the mock has served or rejected.
    pub fn turn_fetches(&self) -> usize {
        self.turn_fetches.load(Ordering::SeqCst)
    }

    /// Makes every fetch of `turn` fail until cleared.
    pub fn fail_turn(&self, turn: u32) {
        self.failing_turns.lock().unwrap().insert(turn);
    }

    pub fn clear_failures(&self) {
        self.failing_turns.lock().unwrap().clear();
    }
}

/// Scripted in-memory transport: replies are queued by `send` and
/// drained by `receive`, mirroring the one-outstanding-request contract.
pub struct MockTransport {
    static_body: Value,
    coords_body: Value,
    dynamic_fn: Box<dyn Fn(u32) -> Value + Send>,
    pending_turn: u32,
    replies: VecDeque<Reply>,
    handle: MockHandle,
}

impl MockTransport {
    pub fn new(static_body: Value, coords_body: Value) -> Self {
        Self::with_dynamic(static_body, coords_body, |_| {
            json!({"trains": [], "posts": [], "ratings": []})
        })
    }

    pub fn with_dynamic(
        static_body: Value,
        coords_body: Value,
        dynamic_fn: impl Fn(u32) -> Value + Send + 'static,
    ) -> Self {
        Self {
            static_body,
            coords_body,
            dynamic_fn: Box::new(dynamic_fn),
            pending_turn: 0,
            replies: VecDeque::new(),
            handle: MockHandle {
                turn_fetches: Arc::new(AtomicUsize::new(0)),
                failing_turns: Arc::new(Mutex::new(HashSet::new())),
            },
        }
    }

    /// A two-point world with one line of length 100 and a single train
    /// that moves 10 units per turn.
    pub fn with_default_world() -> Self {
        let static_body = json!({
            "idx": 1,
            "name": "mock",
            "lines": [{"idx": 1, "length": 100, "points": [1, 2]}],
            "points": [
                {"idx": 1, "post_idx": 10},
                {"idx": 2, "post_idx": 0},
            ],
        });
        let coords_body = json!({
            "idx": 1,
            "size": [30, 30],
            "coordinates": [
                {"idx": 1, "x": 0, "y": 0},
                {"idx": 2, "x": 10, "y": 0},
            ],
        });
        Self::with_dynamic(static_body, coords_body, |turn| {
            json!({
                "trains": [{
                    "idx": 5, "line_idx": 1,
                    "position": (turn * 10).min(100),
                    "cooldown": 0, "goods": 0, "goods_capacity": 40,
                    "speed": 1, "level": 1, "player_idx": "p1",
                }],
                "posts": [{
                    "idx": 10, "type": 1, "armor": 0, "armor_capacity": 200,
                    "level": 1, "population": 3, "population_capacity": 20,
                    "product": 60, "product_capacity": 200, "name": "Home",
                    "player_idx": "p1",
                }],
                "ratings": [{"idx": "p1", "name": "Alice", "rating": turn * 10}],
            })
        })
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }

    fn queue_ok(&mut self, body: Value) {
        self.replies.push_back(Reply {
            status: Status::Okey,
            body: body.to_string().into_bytes(),
        });
    }

    fn queue_error(&mut self, status: Status, detail: &str) {
        self.replies.push_back(Reply {
            status,
            body: detail.as_bytes().to_vec(),
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &mut self,
        action: Action,
        payload: Option<&Value>,
    ) -> Result<(), TransportError> {
        match action {
            Action::Login | Action::Logout => self.queue_ok(json!({})),
            Action::Turn => {
                let turn = payload
                    .and_then(|p| p.get("idx"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32;
                self.handle.turn_fetches.fetch_add(1, Ordering::SeqCst);
                if self.handle.failing_turns.lock().unwrap().contains(&turn) {
                    self.queue_error(Status::InternalServerError, "injected failure");
                } else {
                    self.pending_turn = turn;
                    self.queue_ok(json!({}));
                }
            }
            Action::Map => {
                let layer = payload
                    .and_then(|p| p.get("layer"))
                    .and_then(Value::as_u64)
                    .and_then(|code| Layer::from_code(code as u32));
                match layer {
                    Some(Layer::Static) => {
                        let body = self.static_body.clone();
                        self.queue_ok(body);
                    }
                    Some(Layer::Coordinates) => {
                        let body = self.coords_body.clone();
                        self.queue_ok(body);
                    }
                    Some(Layer::Dynamic) => {
                        let body = (self.dynamic_fn)(self.pending_turn);
                        self.queue_ok(body);
                    }
                    None => self.queue_error(Status::BadCommand, "unknown layer"),
                }
            }
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Reply, TransportError> {
        self.replies
            .pop_front()
            .ok_or(TransportError::ConnectionClosed)
    }
}
