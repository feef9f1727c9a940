use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One poll-participation event in a voter's history.
///
/// A `poll_id` identifies the entry within a single voter's history; the
/// store treats the first entry with a given id as canonical when updating
/// or deleting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollRecord {
    pub poll_id: u64,
    pub vote_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Voter {
    pub voter_id: u64,
    pub first_name: String,
    pub last_name: String,
    /// Insertion-ordered. Append-only except through targeted poll
    /// update/delete.
    #[serde(default)]
    pub vote_history: Vec<PollRecord>,
}
