//! Entity registries.
//!
//! The two long-lived pieces of shared mutable state: logged-in players and
//! live monsters. Each sits behind its own read/write lock. When both locks
//! are needed at once, the monster lock is taken first.

pub mod monster;
pub mod player;

pub use monster::{Monster, MonsterRegistry, TickOutcome, TickPass};
pub use player::{Player, PlayerMove, PlayerPosition, PlayerRegistry};
