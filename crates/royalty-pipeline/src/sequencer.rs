//! Per-track submission ordering.
//!
//! Two guarantees per track:
//!
//! - Submissions are queued: a caller takes the track's [`TrackTurn`] before
//!   encrypting and holds it until the ledger call resolves, so two calls
//!   for one track never interleave.
//! - At most one payout is outstanding: [`TrackSequencer::begin_payout`]
//!   refuses a second payout while a [`PayoutSlot`] for the track is alive.
//!
//! Both guards release on drop, so a cancelled call frees the track. A
//! track's queue is forgotten once nobody holds or waits for its turn.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use royalty_types::TrackId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

use crate::error::PipelineError;
use crate::Result;

type Queues = Arc<Mutex<HashMap<TrackId, QueueEntry>>>;

#[derive(Default)]
struct QueueEntry {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

/// Counts one holder or waiter of a track's queue.
struct QueueRef {
    track_id: TrackId,
    queues: Queues,
}

impl Drop for QueueRef {
    fn drop(&mut self) {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = queues.get_mut(&self.track_id) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                queues.remove(&self.track_id);
            }
        }
    }
}

/// Exclusive access to one track's submission queue.
pub struct TrackTurn {
    // Field order matters: the lock is released before the queue reference.
    _guard: OwnedMutexGuard<()>,
    _queue: QueueRef,
}

/// Marks a payout as in flight for one track until dropped.
pub struct PayoutSlot {
    track_id: TrackId,
    in_flight: Arc<Mutex<HashSet<TrackId>>>,
}

impl Drop for PayoutSlot {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.track_id);
    }
}

/// Serializes submissions per track.
#[derive(Default)]
pub struct TrackSequencer {
    queues: Queues,
    payouts_in_flight: Arc<Mutex<HashSet<TrackId>>>,
}

impl TrackSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for this track's turn.
    pub async fn enter(&self, track_id: TrackId) -> TrackTurn {
        let (lock, queue) = {
            let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = queues.entry(track_id).or_default();
            entry.users += 1;
            let queue = QueueRef {
                track_id,
                queues: Arc::clone(&self.queues),
            };
            (Arc::clone(&entry.lock), queue)
        };
        TrackTurn {
            _guard: lock.lock_owned().await,
            _queue: queue,
        }
    }

    /// Claim the single payout slot for a track.
    ///
    /// # Errors
    ///
    /// [`PipelineError::PayoutInFlight`] if a payout for the track has not
    /// resolved yet.
    pub fn begin_payout(&self, track_id: TrackId) -> Result<PayoutSlot> {
        let mut in_flight = self
            .payouts_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(track_id) {
            warn!(%track_id, "duplicate payout refused while another is in flight");
            return Err(PipelineError::PayoutInFlight { track_id });
        }
        Ok(PayoutSlot {
            track_id,
            in_flight: Arc::clone(&self.payouts_in_flight),
        })
    }

    /// Number of tracks with a live or pending turn.
    pub fn tracked_queues(&self) -> usize {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether a payout for the track is currently outstanding.
    pub fn payout_in_flight(&self, track_id: TrackId) -> bool {
        self.payouts_in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&track_id)
    }
}
