//! Turn scheduling for one room
//!
//! The scheduler owns speaking order, turn position, round counter and the
//! bookkeeping of the single turn timer. It never sleeps itself: arming or
//! cancelling returns a [`TimerCommand`] that the runtime executes. Every
//! command bumps the timer generation, so an expiry carrying an older
//! generation is stale and must be ignored.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::types::ConnectionId;

/// Extra delay past the advertised deadline before the timer fires
pub const TURN_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Replace any pending timer with one firing after `delay`
    Arm { generation: u64, delay: Duration },
    /// Drop the pending timer, if any
    Cancel,
}

/// Where the turn landed after moving on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStep {
    /// Next speaker in the same round
    Speaker,
    /// Started the given round from the first speaker
    NewRound(u32),
    /// Every round has been played
    Exhausted,
}

#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    speak_order: Vec<ConnectionId>,
    speak_index: usize,
    current_round: u32,
    round_count: u32,
    deadline: Option<DateTime<Utc>>,
    generation: u64,
}

impl TurnScheduler {
    /// Begin round 1 with a fixed speaking order
    pub fn start(&mut self, speak_order: Vec<ConnectionId>, round_count: u32) {
        self.speak_order = speak_order;
        self.speak_index = 0;
        self.current_round = 1;
        self.round_count = round_count;
        self.deadline = None;
    }

    /// Forget the game; the generation keeps counting
    pub fn reset(&mut self) {
        self.speak_order.clear();
        self.speak_index = 0;
        self.current_round = 0;
        self.round_count = 0;
        self.deadline = None;
    }

    pub fn speak_order(&self) -> &[ConnectionId] {
        &self.speak_order
    }

    pub fn speak_index(&self) -> usize {
        self.speak_index
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn current_speaker(&self) -> Option<&ConnectionId> {
        self.speak_order.get(self.speak_index)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.deadline.is_some() && self.generation == generation
    }

    /// Arm the timer for the current speaker
    pub fn arm(&mut self, wait: Duration) -> TimerCommand {
        self.generation += 1;
        self.deadline = chrono::Duration::from_std(wait)
            .ok()
            .map(|wait| Utc::now() + wait);
        TimerCommand::Arm {
            generation: self.generation,
            delay: wait + TURN_GRACE,
        }
    }

    pub fn cancel(&mut self) -> TimerCommand {
        self.generation += 1;
        self.deadline = None;
        TimerCommand::Cancel
    }

    /// Move past the current speaker
    pub fn advance(&mut self) -> TurnStep {
        self.speak_index += 1;
        self.settle()
    }

    /// Resolve the turn position after the speaker list or index changed
    pub fn settle(&mut self) -> TurnStep {
        if self.speak_index < self.speak_order.len() {
            TurnStep::Speaker
        } else if self.current_round >= self.round_count {
            self.speak_index = self.speak_order.len();
            TurnStep::Exhausted
        } else {
            self.current_round += 1;
            self.speak_index = 0;
            TurnStep::NewRound(self.current_round)
        }
    }

    /// Drop a departed player from the order.
    ///
    /// Returns true if they held the current turn; the turn then belongs to
    /// whoever followed them and the caller should [`settle`](Self::settle).
    pub fn remove_speaker(&mut self, id: &str) -> bool {
        let Some(pos) = self.speak_order.iter().position(|s| s == id) else {
            return false;
        };
        self.speak_order.remove(pos);
        if pos < self.speak_index {
            self.speak_index -= 1;
            false
        } else {
            pos == self.speak_index
        }
    }

    /// Drop a departed player once no turn is running.
    ///
    /// The position stays at or past the end of the shortened order.
    pub fn retire_speaker(&mut self, id: &str) {
        self.remove_speaker(id);
        self.speak_index = self.speak_index.min(self.speak_order.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[&str]) -> Vec<ConnectionId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_walks_order_then_rounds() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a", "b"]), 2);
        assert_eq!(s.current_round(), 1);
        assert_eq!(s.current_speaker().map(String::as_str), Some("a"));

        assert_eq!(s.advance(), TurnStep::Speaker);
        assert_eq!(s.current_speaker().map(String::as_str), Some("b"));

        assert_eq!(s.advance(), TurnStep::NewRound(2));
        assert_eq!(s.speak_index(), 0);
        assert_eq!(s.speak_order(), order(&["a", "b"]).as_slice());

        assert_eq!(s.advance(), TurnStep::Speaker);
        assert_eq!(s.advance(), TurnStep::Exhausted);
        assert_eq!(s.current_speaker(), None);
        assert_eq!(s.speak_index(), 2);
    }

    #[test]
    fn test_retire_after_exhausted_clamps_index() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a", "b", "c"]), 1);
        for _ in 0..3 {
            s.advance();
        }
        assert_eq!(s.speak_index(), 3);

        s.retire_speaker("c");
        assert_eq!(s.speak_order(), order(&["a", "b"]).as_slice());
        assert_eq!(s.speak_index(), 2);
        assert_eq!(s.current_speaker(), None);

        // Unknown ids leave everything alone
        s.retire_speaker("zz");
        assert_eq!(s.speak_index(), 2);
    }

    #[test]
    fn test_arm_bumps_generation() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a"]), 1);

        let first = s.arm(Duration::from_secs(20));
        let TimerCommand::Arm { generation: g1, delay } = first else {
            panic!("expected arm");
        };
        assert_eq!(delay, Duration::from_secs(20) + TURN_GRACE);
        assert!(s.is_current(g1));
        assert!(s.deadline().is_some());

        let TimerCommand::Arm { generation: g2, .. } = s.arm(Duration::from_secs(20)) else {
            panic!("expected arm");
        };
        assert!(g2 > g1);
        assert!(!s.is_current(g1));
        assert!(s.is_current(g2));

        assert_eq!(s.cancel(), TimerCommand::Cancel);
        assert!(!s.is_current(g2));
        assert!(s.deadline().is_none());
    }

    #[test]
    fn test_remove_speaker_before_current() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a", "b", "c"]), 1);
        s.advance();
        s.advance();
        assert_eq!(s.current_speaker().map(String::as_str), Some("c"));

        assert!(!s.remove_speaker("a"));
        assert_eq!(s.current_speaker().map(String::as_str), Some("c"));
    }

    #[test]
    fn test_remove_current_speaker_passes_turn() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a", "b", "c"]), 1);
        s.advance();

        assert!(s.remove_speaker("b"));
        assert_eq!(s.settle(), TurnStep::Speaker);
        assert_eq!(s.current_speaker().map(String::as_str), Some("c"));

        // Removing the last speaker of the last round exhausts the game
        assert!(s.remove_speaker("c"));
        assert_eq!(s.settle(), TurnStep::Exhausted);
    }

    #[test]
    fn test_remove_unknown_or_later_speaker() {
        let mut s = TurnScheduler::default();
        s.start(order(&["a", "b", "c"]), 1);
        assert!(!s.remove_speaker("zz"));
        assert!(!s.remove_speaker("c"));
        assert_eq!(s.speak_order(), order(&["a", "b"]).as_slice());
        assert_eq!(s.current_speaker().map(String::as_str), Some("a"));
    }
}
