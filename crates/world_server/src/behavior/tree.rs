use super::{BehaviorContext, BehaviorStatus, Node};
use crate::config::AiConfig;

/// A monster's decision tree, built once at spawn.
#[derive(Debug, Clone)]
pub struct BehaviorTree {
    root: Node,
}

impl BehaviorTree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// The standard monster brain: attack a close target, else chase a
    /// detected one, else patrol.
    ///
    /// ```text
    /// Selector
    /// ├── Sequence
    /// │   ├── DetectPlayer(detect_range)
    /// │   └── Selector
    /// │       ├── Sequence
    /// │       │   ├── DetectPlayer(attack_range)
    /// │       │   └── Attack
    /// │       └── Chase
    /// └── Patrol
    /// ```
    pub fn for_monster(ai: &AiConfig) -> Self {
        let engage = Node::Sequence(vec![
            Node::DetectPlayer {
                range: ai.attack_range,
            },
            Node::attack(ai.attack_range, ai.attack_damage, ai.attack_cooldown()),
        ]);
        let pursue = Node::Sequence(vec![
            Node::DetectPlayer {
                range: ai.detect_range,
            },
            Node::Selector(vec![
                engage,
                Node::Chase {
                    speed: ai.chase_speed,
                    epsilon: ai.arrival_epsilon,
                },
            ]),
        ]);
        let patrol = Node::Patrol {
            speed: ai.patrol_speed,
            epsilon: ai.arrival_epsilon,
        };

        Self::new(Node::Selector(vec![pursue, patrol]))
    }

    /// Executes the whole tree once.
    pub fn tick(&mut self, ctx: &mut BehaviorContext<'_>) -> BehaviorStatus {
        self.root.tick(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Effect;
    use crate::registry::{Monster, PlayerPosition};
    use crate::types::{MonsterId, PlayerId, Point};
    use std::time::{Duration, Instant};

    fn tick(tree: &mut BehaviorTree, monster: &mut Monster, players: &[PlayerPosition], now: Instant) -> (BehaviorStatus, Vec<Effect>) {
        let mut effects = Vec::new();
        let mut ctx = BehaviorContext::new(monster, players, now, &mut effects);
        (tree.tick(&mut ctx), effects)
    }

    fn monster() -> Monster {
        Monster::new(MonsterId(1), 100, crate::config::default_patrol_path())
    }

    #[test]
    fn test_patrols_without_players() {
        let mut tree = BehaviorTree::for_monster(&AiConfig::default());
        let mut monster = monster();

        // Already standing on the first waypoint.
        let (status, _) = tick(&mut tree, &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Success);
        assert_eq!(monster.patrol_index, 1);

        let (status, effects) = tick(&mut tree, &mut monster, &[], Instant::now());
        assert_eq!(status, BehaviorStatus::Running);
        assert_eq!(monster.position, Point::new(2.0, 0.0));
        assert_eq!(
            effects,
            vec![Effect::MonsterMoved {
                monster_id: MonsterId(1),
                position: Point::new(2.0, 0.0),
            }]
        );
    }

    #[test]
    fn test_chases_then_attacks() {
        let mut tree = BehaviorTree::for_monster(&AiConfig::default());
        let mut monster = monster();
        let players = [PlayerPosition {
            id: PlayerId(1),
            position: Point::new(8.0, 0.0),
        }];
        let start = Instant::now();

        // 8 away: chase 3 units.
        let (status, _) = tick(&mut tree, &mut monster, &players, start);
        assert_eq!(status, BehaviorStatus::Running);
        assert_eq!(monster.position, Point::new(3.0, 0.0));

        // 5 away: chase again.
        tick(&mut tree, &mut monster, &players, start);
        assert_eq!(monster.position, Point::new(6.0, 0.0));

        // 2 away: inside attack range.
        let (status, effects) = tick(&mut tree, &mut monster, &players, start);
        assert_eq!(status, BehaviorStatus::Success);
        assert!(matches!(effects[..], [Effect::PlayerAttacked { damage: 10, .. }]));

        // Cooling down: the attack branch reports running, no new hit.
        let (status, effects) = tick(&mut tree, &mut monster, &players, start + Duration::from_millis(16));
        assert_eq!(status, BehaviorStatus::Running);
        assert!(effects.is_empty());
        assert_eq!(monster.position, Point::new(6.0, 0.0));
    }

    #[test]
    fn test_far_target_falls_back_to_patrol() {
        let mut tree = BehaviorTree::for_monster(&AiConfig::default());
        let mut monster = monster();
        let players = [PlayerPosition {
            id: PlayerId(1),
            position: Point::new(100.0, 100.0),
        }];

        let (status, _) = tick(&mut tree, &mut monster, &players, Instant::now());
        assert_eq!(status, BehaviorStatus::Success);
        assert_eq!(monster.target, Some(PlayerId(1)));
        assert_eq!(monster.patrol_index, 1);
    }
}
