//! Behavior tree nodes.
//!
//! The node set is closed: two composites that control flow and four leaves
//! that act on the monster. Every node is executed at most once per tick and
//! never blocks.

use super::{BehaviorContext, BehaviorStatus, Effect};
use std::time::{Duration, Instant};

/// One node of a monster's behavior tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// Runs children left to right while they succeed.
    ///
    /// Returns the first `Failure` or `Running` and skips the rest;
    /// `Success` only when every child succeeded.
    Sequence(Vec<Node>),

    /// Runs children left to right while they fail.
    ///
    /// Returns the first `Success` or `Running` and skips the rest;
    /// `Failure` only when every child failed.
    Selector(Vec<Node>),

    /// Latches a target if none is held, then checks it is within `range`.
    ///
    /// Acquisition takes the first player of the snapshot, not the nearest.
    /// A latched target is kept until it leaves the world.
    DetectPlayer { range: f32 },

    /// Hits the latched target once per cooldown window.
    Attack {
        range: f32,
        damage: i32,
        cooldown: Duration,
        last_attack: Option<Instant>,
    },

    /// Closes in on the latched target by `speed` per tick.
    Chase { speed: f32, epsilon: f32 },

    /// Walks the monster's cyclic waypoint list by `speed` per tick.
    Patrol { speed: f32, epsilon: f32 },
}

impl Node {
    /// An attack node that has never fired.
    pub fn attack(range: f32, damage: i32, cooldown: Duration) -> Self {
        Node::Attack {
            range,
            damage,
            cooldown,
            last_attack: None,
        }
    }

    /// Executes this node against one monster.
    pub fn tick(&mut self, ctx: &mut BehaviorContext<'_>) -> BehaviorStatus {
        match self {
            Node::Sequence(children) => {
                for child in children.iter_mut() {
                    match child.tick(ctx) {
                        BehaviorStatus::Success => continue,
                        status => return status,
                    }
                }
                BehaviorStatus::Success
            }
            Node::Selector(children) => {
                for child in children.iter_mut() {
                    match child.tick(ctx) {
                        BehaviorStatus::Failure => continue,
                        status => return status,
                    }
                }
                BehaviorStatus::Failure
            }
            Node::DetectPlayer { range } => detect_player(ctx, *range),
            Node::Attack {
                range,
                damage,
                cooldown,
                last_attack,
            } => attack(ctx, *range, *damage, *cooldown, last_attack),
            Node::Chase { speed, epsilon } => chase(ctx, *speed, *epsilon),
            Node::Patrol { speed, epsilon } => patrol(ctx, *speed, *epsilon),
        }
    }
}

fn detect_player(ctx: &mut BehaviorContext<'_>, range: f32) -> BehaviorStatus {
    let target = match ctx.target_position() {
        Some(position) => position,
        None => match ctx.players.first() {
            Some(first) => {
                ctx.monster.target = Some(first.id);
                first.position
            }
            None => return BehaviorStatus::Failure,
        },
    };

    if ctx.monster.position.distance(&target) <= range {
        BehaviorStatus::Success
    } else {
        BehaviorStatus::Failure
    }
}

fn attack(
    ctx: &mut BehaviorContext<'_>,
    range: f32,
    damage: i32,
    cooldown: Duration,
    last_attack: &mut Option<Instant>,
) -> BehaviorStatus {
    if ctx.monster.is_dead() {
        return BehaviorStatus::Failure;
    }
    let Some(target) = ctx.monster.target else {
        return BehaviorStatus::Failure;
    };
    let Some(position) = ctx.target_position() else {
        return BehaviorStatus::Failure;
    };
    if ctx.monster.position.distance(&position) > range {
        return BehaviorStatus::Failure;
    }

    if let Some(last) = *last_attack {
        if ctx.now.saturating_duration_since(last) < cooldown {
            return BehaviorStatus::Running;
        }
    }

    *last_attack = Some(ctx.now);
    let monster_id = ctx.monster.id;
    ctx.emit(Effect::PlayerAttacked {
        monster_id,
        target,
        damage,
    });
    BehaviorStatus::Success
}

fn chase(ctx: &mut BehaviorContext<'_>, speed: f32, epsilon: f32) -> BehaviorStatus {
    let Some(target) = ctx.target_position() else {
        return BehaviorStatus::Failure;
    };
    let current = ctx.monster.position;
    if current.distance(&target) < epsilon {
        return BehaviorStatus::Success;
    }
    ctx.move_monster(current.step_towards(&target, speed));
    BehaviorStatus::Running
}

fn patrol(ctx: &mut BehaviorContext<'_>, speed: f32, epsilon: f32) -> BehaviorStatus {
    let len = ctx.monster.patrol_path.len();
    if len == 0 {
        return BehaviorStatus::Failure;
    }
    let index = ctx.monster.patrol_index % len;
    let waypoint = ctx.monster.patrol_path[index];
    let current = ctx.monster.position;

    if current.distance(&waypoint) < epsilon {
        ctx.monster.patrol_index = (index + 1) % len;
        return BehaviorStatus::Success;
    }
    ctx.move_monster(current.step_towards(&waypoint, speed));
    BehaviorStatus::Running
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Monster, PlayerPosition};
    use crate::types::{MonsterId, PlayerId, Point};

    fn monster_at(x: f32, z: f32) -> Monster {
        let mut monster = Monster::new(MonsterId(1), 100, vec![]);
        monster.position = Point::new(x, z);
        monster
    }

    fn player_at(id: u64, x: f32, z: f32) -> PlayerPosition {
        PlayerPosition {
            id: PlayerId(id),
            position: Point::new(x, z),
        }
    }

    fn run(node: &mut Node, monster: &mut Monster, players: &[PlayerPosition], now: Instant) -> (BehaviorStatus, Vec<Effect>) {
        let mut effects = Vec::new();
        let mut ctx = BehaviorContext::new(monster, players, now, &mut effects);
        let status = node.tick(&mut ctx);
        (status, effects)
    }

    fn chase() -> Node {
        Node::Chase {
            speed: 3.0,
            epsilon: 1.0,
        }
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let players = [player_at(1, 5.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        let mut tree = Node::Sequence(vec![
            Node::DetectPlayer { range: 100.0 },
            Node::DetectPlayer { range: 1.0 },
            chase(),
        ]);

        let (status, effects) = run(&mut tree, &mut monster, &players, Instant::now());

        assert_eq!(status, BehaviorStatus::Failure);
        assert!(effects.is_empty());
        assert_eq!(monster.position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_selector_stops_at_first_success() {
        let players = [player_at(1, 5.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        let mut tree = Node::Selector(vec![
            Node::DetectPlayer { range: 1.0 },
            Node::DetectPlayer { range: 100.0 },
            chase(),
        ]);

        let (status, effects) = run(&mut tree, &mut monster, &players, Instant::now());

        assert_eq!(status, BehaviorStatus::Success);
        assert!(effects.is_empty());
        assert_eq!(monster.position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_selector_fails_when_every_child_fails() {
        let mut monster = monster_at(0.0, 0.0);
        let mut tree = Node::Selector(vec![
            Node::DetectPlayer { range: 10.0 },
            Node::Patrol {
                speed: 2.0,
                epsilon: 1.0,
            },
        ]);
        let (status, _) = run(&mut tree, &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
    }

    #[test]
    fn test_sequence_propagates_running() {
        let players = [player_at(1, 8.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        let mut tree = Node::Sequence(vec![Node::DetectPlayer { range: 10.0 }, chase()]);

        let (status, effects) = run(&mut tree, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Running);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_detect_latches_first_player_not_nearest() {
        let players = [player_at(1, 50.0, 0.0), player_at(2, 1.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        let mut detect = Node::DetectPlayer { range: 10.0 };

        let (status, _) = run(&mut detect, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
        assert_eq!(monster.target, Some(PlayerId(1)));

        // Still latched on the far player even though another is close.
        let (status, _) = run(&mut detect, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
        assert_eq!(monster.target, Some(PlayerId(1)));
    }

    #[test]
    fn test_detect_releases_target_that_left() {
        let mut monster = monster_at(0.0, 0.0);
        monster.target = Some(PlayerId(7));
        let players = [player_at(3, 2.0, 0.0)];
        let mut detect = Node::DetectPlayer { range: 10.0 };

        let (status, _) = run(&mut detect, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Success);
        assert_eq!(monster.target, Some(PlayerId(3)));
    }

    #[test]
    fn test_detect_without_players_fails() {
        let mut monster = monster_at(0.0, 0.0);
        let (status, _) = run(&mut Node::DetectPlayer { range: 10.0 }, &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
        assert_eq!(monster.target, None);
    }

    #[test]
    fn test_attack_respects_cooldown() {
        let players = [player_at(1, 1.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        monster.target = Some(PlayerId(1));
        let mut attack = Node::attack(2.0, 10, Duration::from_secs(1));
        let start = Instant::now();

        let (status, effects) = run(&mut attack, &mut monster, &players, start);
        assert_eq!(status, BehaviorStatus::Success);
        assert_eq!(
            effects,
            vec![Effect::PlayerAttacked {
                monster_id: MonsterId(1),
                target: PlayerId(1),
                damage: 10,
            }]
        );

        for offset in [0, 100, 500, 999] {
            let now = start + Duration::from_millis(offset);
            let (status, effects) = run(&mut attack, &mut monster, &players, now);
            assert_eq!(status, BehaviorStatus::Running);
            assert!(effects.is_empty());
        }

        let (status, _) = run(&mut attack, &mut monster, &players, start + Duration::from_secs(1));
        assert_eq!(status, BehaviorStatus::Success);
    }

    #[test]
    fn test_attack_fails_out_of_range_without_target_or_when_dead() {
        let players = [player_at(1, 5.0, 0.0)];
        let mut attack = Node::attack(2.0, 10, Duration::from_secs(1));

        let mut monster = monster_at(0.0, 0.0);
        let (status, _) = run(&mut attack, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);

        monster.target = Some(PlayerId(1));
        let (status, _) = run(&mut attack, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);

        let mut close = monster_at(4.0, 0.0);
        close.target = Some(PlayerId(1));
        close.set_health(0);
        let (status, effects) = run(&mut attack, &mut close, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_chase_closes_in_until_arrival() {
        let players = [player_at(1, 10.0, 0.0)];
        let mut monster = monster_at(0.0, 0.0);
        monster.target = Some(PlayerId(1));
        let mut node = chase();
        let target = Point::new(10.0, 0.0);

        let mut previous = monster.position.distance(&target);
        let mut running = 0;
        loop {
            let (status, effects) = run(&mut node, &mut monster, &players, Instant::now());
            match status {
                BehaviorStatus::Running => {
                    let now = monster.position.distance(&target);
                    assert!(now < previous);
                    assert_eq!(effects.len(), 1);
                    previous = now;
                    running += 1;
                }
                BehaviorStatus::Success => break,
                BehaviorStatus::Failure => panic!("chase failed with a target"),
            }
            assert!(running < 10, "chase never arrived");
        }

        assert_eq!(running, 4);
        let (status, _) = run(&mut node, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Success);
    }

    #[test]
    fn test_chase_without_target_fails() {
        let mut monster = monster_at(0.0, 0.0);
        let (status, _) = run(&mut chase(), &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
    }

    #[test]
    fn test_patrol_wraps_after_two_arrivals() {
        let mut monster = monster_at(0.0, 0.0);
        monster.patrol_path = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        let mut node = Node::Patrol {
            speed: 2.0,
            epsilon: 1.0,
        };

        let mut arrivals = 0;
        while arrivals < 2 {
            let (status, _) = run(&mut node, &mut monster, &[], Instant::now());
            if status.is_success() {
                arrivals += 1;
            }
        }
        assert_eq!(monster.patrol_index, 0);
        assert_eq!(monster.position, Point::new(4.0, 0.0));
    }

    #[test]
    fn test_patrol_empty_path_fails() {
        let mut monster = monster_at(0.0, 0.0);
        let mut node = Node::Patrol {
            speed: 2.0,
            epsilon: 1.0,
        };
        let (status, effects) = run(&mut node, &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Failure);
        assert!(effects.is_empty());
    }
}
