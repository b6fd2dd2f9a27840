//! Vote tallying with deterministic tie-breaking

use serde::{Deserialize, Serialize};

use crate::types::ConnectionId;

/// Number of votes one target received
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteCount {
    pub target_id: ConnectionId,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    /// None only when no votes were cast
    pub selected_id: Option<ConnectionId>,
    /// Per-target counts, in the order targets first received a vote
    pub counts: Vec<VoteCount>,
}

/// Tally `(voter, target)` pairs given in the order they were cast.
///
/// The winner is decided on final counts. Among targets tied at the
/// maximum, the one that received its first vote earliest wins, even if
/// another tied target reached the maximum sooner: B,A,A,B selects B.
pub fn tally<'a, I>(votes: I) -> Tally
where
    I: IntoIterator<Item = (&'a ConnectionId, &'a ConnectionId)>,
{
    let mut counts: Vec<VoteCount> = Vec::new();
    for (_voter, target) in votes {
        match counts.iter_mut().find(|c| c.target_id == *target) {
            Some(entry) => entry.count += 1,
            None => counts.push(VoteCount {
                target_id: target.clone(),
                count: 1,
            }),
        }
    }

    let mut max = 0;
    let mut leaders: Vec<&ConnectionId> = Vec::new();
    for entry in &counts {
        if entry.count > max {
            max = entry.count;
            leaders = vec![&entry.target_id];
        } else if entry.count == max {
            leaders.push(&entry.target_id);
        }
    }

    Tally {
        selected_id: leaders.first().map(|id| (*id).clone()),
        counts,
    }
}
