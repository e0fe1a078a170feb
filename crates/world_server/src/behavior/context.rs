//! Evaluation context handed to behavior nodes.
//!
//! A node sees the monster it belongs to, a read-only snapshot of player
//! positions taken before the pass, and the tick timestamp. Anything that
//! must reach the outside world is pushed as an [`Effect`]; nodes never touch
//! a connection.

use crate::registry::{Monster, PlayerPosition};
use crate::types::{MonsterId, PlayerId, Point};
use std::time::Instant;

/// Side effect produced while evaluating a tree, delivered after the pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The monster changed position
    MonsterMoved { monster_id: MonsterId, position: Point },
    /// The monster landed a hit on a player
    PlayerAttacked {
        monster_id: MonsterId,
        target: PlayerId,
        damage: i32,
    },
}

/// Blackboard for one monster during one tick.
pub struct BehaviorContext<'a> {
    pub monster: &'a mut Monster,
    pub players: &'a [PlayerPosition],
    pub now: Instant,
    effects: &'a mut Vec<Effect>,
}

impl<'a> BehaviorContext<'a> {
    pub fn new(
        monster: &'a mut Monster,
        players: &'a [PlayerPosition],
        now: Instant,
        effects: &'a mut Vec<Effect>,
    ) -> Self {
        Self {
            monster,
            players,
            now,
            effects,
        }
    }

    /// Current position of the latched target.
    ///
    /// A target missing from the snapshot has left the world; the latch is
    /// released so detection can acquire a new one.
    pub fn target_position(&mut self) -> Option<Point> {
        let target = self.monster.target?;
        let found = self
            .players
            .iter()
            .find(|p| p.id == target)
            .map(|p| p.position);
        if found.is_none() {
            self.monster.target = None;
        }
        found
    }

    /// Moves the monster and records the move.
    pub fn move_monster(&mut self, position: Point) {
        self.monster.position = position;
        self.effects.push(Effect::MonsterMoved {
            monster_id: self.monster.id,
            position,
        });
    }

    /// Records an effect for delivery after the pass.
    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }
}
