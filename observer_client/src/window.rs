//! The turn window: previous/current snapshot slots plus one
//! speculative prefetch of the turn ahead.
//!
//! Steady forward playback never blocks on the network: each call to
//! [`TurnWindow::advance_to`] that crosses a turn boundary adopts the
//! prefetched snapshot and rolls the old current into previous, both
//! pure slot moves. Only discontinuous seeks pay synchronous round
//! trips.
//!
//! The prefetch publishes through a `oneshot` channel, so the window can
//! never observe a snapshot that is not fully decoded, and a completion
//! arriving after a seek or teardown finds the channel closed and is
//! discarded. Fetch I/O runs outside any window state; the transport
//! mutex only serializes the wire exchanges.

use std::sync::Arc;

use observer_shared::{
    error::{FetchError, TransportError},
    net::Transport,
};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::snapshot::{self, Snapshot};

/// One window slot. Previous/current are never observable mid-load;
/// the loading state of the next turn lives in [`Prefetch`].
#[derive(Debug, Clone)]
enum Slot {
    Empty,
    Ready(Snapshot),
}

impl Slot {
    fn ready_at(&self, turn: u32) -> bool {
        matches!(self, Slot::Ready(snap) if snap.turn == turn)
    }

    fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Slot::Empty => None,
            Slot::Ready(snap) => Some(snap),
        }
    }
}

/// An in-flight fetch of the turn one step ahead.
#[derive(Debug)]
struct Prefetch {
    turn: u32,
    rx: oneshot::Receiver<Result<Snapshot, FetchError>>,
}

/// Fetch accounting, exposed for status displays and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowStats {
    /// Blocking fetches performed inside `advance_to` (bootstrap/seek).
    pub sync_fetches: u64,
    /// Speculative fetches launched.
    pub prefetch_launches: u64,
    /// Prefetches that came back failed and were retried.
    pub prefetch_failures: u64,
}

/// Rolling window of at most three turn snapshots.
pub struct TurnWindow<T: Transport + 'static> {
    transport: Arc<Mutex<T>>,
    prev: Slot,
    cur: Slot,
    prefetch: Option<Prefetch>,
    last_error: Option<FetchError>,
    stats: WindowStats,
}

impl<T: Transport + 'static> TurnWindow<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            prev: Slot::Empty,
            cur: Slot::Empty,
            prefetch: None,
            last_error: None,
            stats: WindowStats::default(),
        }
    }

    /// Handle to the shared transport, e.g. for a logout on shutdown.
    pub fn transport(&self) -> Arc<Mutex<T>> {
        Arc::clone(&self.transport)
    }

    /// Ensures previous/current bracket the fractional `target` turn.
    ///
    /// Steady playback resolves from the prefetch and pure slot moves;
    /// seeks fetch synchronously and propagate failure. A failed
    /// *prefetch* degrades instead: the window stays at the last good
    /// turn, the error is recorded, and the fetch is relaunched for the
    /// next call to retry.
    pub async fn advance_to(&mut self, target: f64) -> Result<(), FetchError> {
        let target = target.max(0.0);
        let prev_turn = target.floor() as u32;
        let cur_turn = target.ceil() as u32;

        // Common per-frame path: nothing to do.
        if self.prev.ready_at(prev_turn) && self.cur.ready_at(cur_turn) {
            return Ok(());
        }

        // Crossing a turn boundary rolls the old current into previous
        // before anything overwrites it. Pure slot move, no I/O.
        if !self.prev.ready_at(prev_turn) && self.cur.ready_at(prev_turn) {
            self.prev = self.cur.clone();
        }

        if !self.cur.ready_at(cur_turn) {
            if let Some(pending) = self.take_prefetch_for(cur_turn) {
                match pending.rx.await {
                    Ok(Ok(snap)) => {
                        self.cur = Slot::Ready(snap);
                        self.last_error = None;
                    }
                    Ok(Err(err)) => return self.degrade(cur_turn, err),
                    Err(_) => {
                        let err = FetchError::Transport(TransportError::ConnectionClosed);
                        return self.degrade(cur_turn, err);
                    }
                }
            } else if self.prev.ready_at(cur_turn) {
                self.cur = self.prev.clone();
            } else {
                let snap = self.fetch_blocking(cur_turn).await?;
                self.cur = Slot::Ready(snap);
            }
        }

        if !self.prev.ready_at(prev_turn) {
            if self.cur.ready_at(prev_turn) {
                self.prev = self.cur.clone();
            } else {
                let snap = self.fetch_blocking(prev_turn).await?;
                self.prev = Slot::Ready(snap);
            }
        }

        self.ensure_prefetch(cur_turn + 1);

        debug_assert!(
            self.bracket_turns()
                .map(|(p, c)| p <= c)
                .unwrap_or(true),
            "window invariant violated: previous.turn > current.turn"
        );
        Ok(())
    }

    /// The snapshot at the floor of the last advanced turn.
    pub fn previous(&self) -> Option<&Snapshot> {
        self.prev.snapshot()
    }

    /// The snapshot at the ceiling of the last advanced turn.
    pub fn current(&self) -> Option<&Snapshot> {
        self.cur.snapshot()
    }

    /// Turn indices held by (previous, current), once both are ready.
    pub fn bracket_turns(&self) -> Option<(u32, u32)> {
        match (self.prev.snapshot(), self.cur.snapshot()) {
            (Some(p), Some(c)) => Some((p.turn, c.turn)),
            _ => None,
        }
    }

    /// The most recent prefetch failure still awaiting a successful retry.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    fn take_prefetch_for(&mut self, turn: u32) -> Option<Prefetch> {
        match &self.prefetch {
            Some(p) if p.turn == turn => self.prefetch.take(),
            _ => None,
        }
    }

    /// Steady playback survives a lost prefetch: freeze at the last good
    /// turn and queue the fetch again.
    fn degrade(&mut self, needed: u32, err: FetchError) -> Result<(), FetchError> {
        if matches!(self.cur, Slot::Empty) {
            return Err(err);
        }
        warn!(
            turn = needed,
            error = %err,
            "prefetch failed; playback frozen at last good turn"
        );
        self.stats.prefetch_failures += 1;
        self.last_error = Some(err);
        self.spawn_prefetch(needed);
        Ok(())
    }

    async fn fetch_blocking(&mut self, turn: u32) -> Result<Snapshot, FetchError> {
        self.stats.sync_fetches += 1;
        let mut conn = self.transport.lock().await;
        snapshot::fetch(&mut *conn, turn).await
    }

    fn ensure_prefetch(&mut self, turn: u32) {
        if let Some(p) = &self.prefetch {
            if p.turn == turn {
                return;
            }
            // A seek moved the window; the stale fetch completes into a
            // closed channel and is discarded.
            self.prefetch = None;
        }
        self.spawn_prefetch(turn);
    }

    fn spawn_prefetch(&mut self, turn: u32) {
        debug_assert!(self.prefetch.is_none(), "prefetch already in flight");

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let result = {
                let mut conn = transport.lock().await;
                snapshot::fetch(&mut *conn, turn).await
            };
            if tx.send(result).is_err() {
                debug!(turn, "prefetch result discarded; window moved on");
            }
        });

        self.stats.prefetch_launches += 1;
        self.prefetch = Some(Prefetch { turn, rx });
    }
}
