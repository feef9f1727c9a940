use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::{PollRecord, Voter};

/// Read-only view of store metadata returned by [`VoterStore::health`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub uptime: Duration,
    pub total_calls: u64,
    pub error_calls: u64,
}

/// Exclusive owner of all voter state.
///
/// The record map sits behind a single reader/writer lock: reads take the
/// shared side, mutations the exclusive side, and every operation holds the
/// lock for its whole (short, non-blocking) critical section, so operations
/// are linearized by lock acquisition order. Callers only ever receive
/// copies, never references into the map.
///
/// The call counters are atomics rather than lock-guarded state: the
/// transport layer bumps them around every request and must not contend
/// with data operations.
pub struct VoterStore {
    records: RwLock<BTreeMap<u64, Voter>>,
    boot_time: DateTime<Utc>,
    total_calls: AtomicU64,
    error_calls: AtomicU64,
}

impl VoterStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            boot_time: Utc::now(),
            total_calls: AtomicU64::new(0),
            error_calls: AtomicU64::new(0),
        }
    }

    /// Snapshot of all voters in ascending-id order. Callers must not rely
    /// on the order.
    pub async fn list_voters(&self) -> Vec<Voter> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn get_voter(&self, voter_id: u64) -> Option<Voter> {
        self.records.read().await.get(&voter_id).cloned()
    }

    /// Insert-or-replace under `v.voter_id`. A replace drops the previous
    /// record entirely, history included.
    pub async fn put_voter(&self, v: Voter) {
        self.records.write().await.insert(v.voter_id, v);
    }

    /// Full replace of an existing record. The path-supplied id is
    /// canonical; a mismatched id in `v` is overwritten.
    pub async fn update_voter(&self, voter_id: u64, mut v: Voter) -> Option<Voter> {
        let mut records = self.records.write().await;
        if !records.contains_key(&voter_id) {
            return None;
        }
        v.voter_id = voter_id;
        records.insert(voter_id, v.clone());
        Some(v)
    }

    pub async fn delete_voter(&self, voter_id: u64) -> bool {
        self.records.write().await.remove(&voter_id).is_some()
    }

    pub async fn voter_history(&self, voter_id: u64) -> Option<Vec<PollRecord>> {
        let records = self.records.read().await;
        records.get(&voter_id).map(|v| v.vote_history.clone())
    }

    /// First history entry matching `poll_id`, or `None` when either the
    /// voter or the entry is absent. The two cases are indistinguishable to
    /// the caller.
    pub async fn get_poll(&self, voter_id: u64, poll_id: u64) -> Option<PollRecord> {
        let records = self.records.read().await;
        let voter = records.get(&voter_id)?;
        voter
            .vote_history
            .iter()
            .find(|p| p.poll_id == poll_id)
            .cloned()
    }

    /// Appends to the voter's history; `false` if the voter is absent.
    ///
    /// No duplicate check: a second entry with the same `poll_id` is
    /// accepted, and update/delete below only ever touch the first match.
    pub async fn add_poll(&self, voter_id: u64, p: PollRecord) -> bool {
        let mut records = self.records.write().await;
        let Some(voter) = records.get_mut(&voter_id) else {
            return false;
        };
        voter.vote_history.push(p);
        true
    }

    /// Replaces the first history entry matching `poll_id`, forcing the
    /// path-supplied id into the stored record. Later duplicates are left
    /// untouched.
    pub async fn update_poll(
        &self,
        voter_id: u64,
        poll_id: u64,
        mut p: PollRecord,
    ) -> Option<PollRecord> {
        let mut records = self.records.write().await;
        let voter = records.get_mut(&voter_id)?;
        let slot = voter
            .vote_history
            .iter_mut()
            .find(|q| q.poll_id == poll_id)?;
        p.poll_id = poll_id;
        *slot = p.clone();
        Some(p)
    }

    /// Removes the first history entry matching `poll_id`, preserving the
    /// relative order of the rest.
    pub async fn delete_poll(&self, voter_id: u64, poll_id: u64) -> bool {
        let mut records = self.records.write().await;
        let Some(voter) = records.get_mut(&voter_id) else {
            return false;
        };
        let Some(i) = voter
            .vote_history
            .iter()
            .position(|q| q.poll_id == poll_id)
        else {
            return false;
        };
        voter.vote_history.remove(i);
        true
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            uptime: Utc::now().signed_duration_since(self.boot_time),
            total_calls: self.total_calls.load(Ordering::Relaxed),
            error_calls: self.error_calls.load(Ordering::Relaxed),
        }
    }

    pub fn record_call(&self) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_calls.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for VoterStore {
    fn default() -> Self {
        Self::new()
    }
}
