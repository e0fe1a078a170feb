//! Behavior tree engine.
//!
//! Each monster owns one [`BehaviorTree`], executed once per AI tick against
//! a [`BehaviorContext`]. Nodes return a [`BehaviorStatus`] and report
//! outward-facing consequences as [`Effect`]s instead of sending anything.

pub mod context;
pub mod node;
pub mod status;
pub mod tree;

pub use context::{BehaviorContext, Effect};
pub use node::Node;
pub use status::BehaviorStatus;
pub use tree::BehaviorTree;
