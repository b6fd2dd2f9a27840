//! Game rules: clue admission, vote tallying, turn scheduling and the
//! per-room state machine that ties them together.
//!
//! Nothing in here touches the network or the clock beyond reading the
//! current time; the runtime in [`crate::state`] executes the returned
//! effects.

pub mod clue;
pub mod room;
pub mod scheduler;
pub mod tally;

pub use room::{Effects, Outbound, Recipient, Room};
pub use scheduler::{TimerCommand, TurnScheduler};
