/// Result of executing one behavior node.
///
/// `Failure` and `Running` are ordinary control flow, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorStatus {
    /// The node achieved its goal
    Success,
    /// The node cannot achieve its goal right now
    Failure,
    /// The node is making progress and wants to be ticked again
    Running,
}

impl BehaviorStatus {
    /// Whether this status is [`BehaviorStatus::Success`].
    #[inline]
    pub fn is_success(self) -> bool {
        self == BehaviorStatus::Success
    }
}
