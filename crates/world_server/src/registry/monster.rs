//! Monster registry.
//!
//! Owns every live monster together with the behavior tree bound to it at
//! spawn time. The tick scheduler evaluates all trees under the write lock
//! and receives the effects they produced; delivering those effects is the
//! scheduler's business, never the registry's. The lock is only downgraded
//! to a read lock for delivery, so a despawn always lands after the moves
//! of the pass that was running when it was requested.

use super::{PlayerPosition, PlayerRegistry};
use crate::behavior::{BehaviorContext, BehaviorTree, Effect};
use crate::config::AiConfig;
use crate::error::WorldError;
use crate::messaging::GameMessage;
use crate::types::{MonsterId, PlayerId, Point};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::info;

/// A live monster.
#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub id: MonsterId,
    pub position: Point,
    pub health: i32,
    pub max_health: i32,
    /// Latched target, resolved against the current player snapshot each tick
    pub target: Option<PlayerId>,
    pub patrol_path: Vec<Point>,
    pub patrol_index: usize,
}

impl Monster {
    /// Creates a monster at the origin with full health.
    pub fn new(id: MonsterId, max_health: i32, patrol_path: Vec<Point>) -> Self {
        Self {
            id,
            position: Point::default(),
            health: max_health,
            max_health,
            target: None,
            patrol_path,
            patrol_index: 0,
        }
    }

    /// Sets health, clamped to `[0, max_health]`.
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.max_health);
    }

    /// Whether the monster's health is exhausted.
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub(crate) fn spawn_message(&self) -> GameMessage {
        GameMessage::SpawnMonster {
            monster_id: self.id,
            x: self.position.x,
            z: self.position.z,
        }
    }
}

#[derive(Debug)]
struct MonsterSlot {
    monster: Monster,
    brain: BehaviorTree,
}

/// Result of one evaluation pass over every monster.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Monsters whose tree was executed
    pub evaluated: usize,
    /// Dead monsters left untouched
    pub skipped: usize,
    /// Side effects to deliver once the pass is over
    pub effects: Vec<Effect>,
}

/// An evaluation pass whose effects are still being delivered.
///
/// Keeps the registry read-locked until dropped: spawns and despawns wait
/// for the pass, while lookups and listings proceed.
#[derive(Debug)]
pub struct TickPass<'a> {
    pub outcome: TickOutcome,
    _monsters: RwLockReadGuard<'a, BTreeMap<MonsterId, MonsterSlot>>,
}

/// Registry of live monsters.
#[derive(Debug)]
pub struct MonsterRegistry {
    monsters: RwLock<BTreeMap<MonsterId, MonsterSlot>>,
    next_id: AtomicU32,
    ai: AiConfig,
}

impl MonsterRegistry {
    /// Creates an empty registry; spawned monsters are tuned by `ai`.
    pub fn new(ai: AiConfig) -> Self {
        Self {
            monsters: RwLock::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
            ai,
        }
    }

    /// Spawns a monster at the origin and announces it to every player.
    ///
    /// The monster gets the configured patrol path and a fresh behavior
    /// tree that stays bound to it for its whole life.
    pub async fn add_monster(&self, players: &PlayerRegistry) -> Monster {
        let mut monsters = self.monsters.write().await;

        let id = MonsterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let monster = Monster::new(id, self.ai.monster_max_health, self.ai.patrol_path.clone());
        let slot = MonsterSlot {
            monster: monster.clone(),
            brain: BehaviorTree::for_monster(&self.ai),
        };
        monsters.insert(id, slot);

        let announced = players.broadcast_all(&monster.spawn_message()).await;
        info!(
            "👹 Monster {} spawned at {}, announced to {} players",
            id, monster.position, announced
        );
        monster
    }

    /// Removes a monster and tells every player it is gone.
    ///
    /// # Errors
    ///
    /// [`WorldError::MonsterNotFound`] if no live monster has `id`.
    pub async fn remove_monster(&self, id: MonsterId, players: &PlayerRegistry) -> Result<Monster, WorldError> {
        let mut monsters = self.monsters.write().await;
        let slot = monsters.remove(&id).ok_or(WorldError::MonsterNotFound(id))?;

        players
            .broadcast_all(&GameMessage::DespawnMonster { monster_id: id })
            .await;
        info!("💀 Monster {} despawned", id);
        Ok(slot.monster)
    }

    /// Looks a monster up by id.
    pub async fn get_monster(&self, id: MonsterId) -> Result<Monster, WorldError> {
        self.monsters
            .read()
            .await
            .get(&id)
            .map(|slot| slot.monster.clone())
            .ok_or(WorldError::MonsterNotFound(id))
    }

    /// Copies of all live monsters, in id order.
    pub async fn list_monsters(&self) -> Vec<Monster> {
        self.monsters
            .read()
            .await
            .values()
            .map(|slot| slot.monster.clone())
            .collect()
    }

    /// Number of live monsters.
    pub async fn len(&self) -> usize {
        self.monsters.read().await.len()
    }

    /// Whether no monster is alive.
    pub async fn is_empty(&self) -> bool {
        self.monsters.read().await.is_empty()
    }

    /// Sets a monster's health, clamped to its bounds.
    pub async fn set_health(&self, id: MonsterId, health: i32) -> Result<i32, WorldError> {
        let mut monsters = self.monsters.write().await;
        let slot = monsters.get_mut(&id).ok_or(WorldError::MonsterNotFound(id))?;
        slot.monster.set_health(health);
        Ok(slot.monster.health)
    }

    /// Executes every live monster's behavior tree exactly once.
    ///
    /// `players` is the positional snapshot targets are resolved against.
    /// Dead monsters are skipped. Deliver the effects before dropping the
    /// returned pass.
    pub async fn evaluate_all(&self, players: &[PlayerPosition], now: Instant) -> TickPass<'_> {
        let mut monsters = self.monsters.write().await;
        let mut outcome = TickOutcome::default();

        for slot in monsters.values_mut() {
            if slot.monster.is_dead() {
                outcome.skipped += 1;
                continue;
            }
            let mut ctx = BehaviorContext::new(&mut slot.monster, players, now, &mut outcome.effects);
            slot.brain.tick(&mut ctx);
            outcome.evaluated += 1;
        }

        TickPass {
            outcome,
            _monsters: monsters.downgrade(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::Broadcaster;
    use crate::connection::ConnectionHandle;
    use crate::messaging::decode;
    use std::sync::Arc;

    fn players() -> PlayerRegistry {
        PlayerRegistry::new(Arc::new(Broadcaster::new()), 100)
    }

    #[test]
    fn test_set_health_clamps() {
        let mut monster = Monster::new(MonsterId(1), 100, vec![]);
        monster.set_health(-5);
        assert_eq!(monster.health, 0);
        assert!(monster.is_dead());

        monster.set_health(monster.max_health + 100);
        assert_eq!(monster.health, 100);
        assert!(!monster.is_dead());
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_are_never_reused() {
        let players = players();
        let monsters = MonsterRegistry::new(AiConfig::default());

        let first = monsters.add_monster(&players).await;
        let second = monsters.add_monster(&players).await;
        assert_eq!(first.id, MonsterId(1));
        assert_eq!(second.id, MonsterId(2));

        monsters.remove_monster(second.id, &players).await.unwrap();
        let third = monsters.add_monster(&players).await;
        assert_eq!(third.id, MonsterId(3));
        assert_eq!(monsters.len().await, 2);
    }

    #[tokio::test]
    async fn test_spawned_monster_has_default_patrol_and_full_health() {
        let players = players();
        let monsters = MonsterRegistry::new(AiConfig::default());
        let monster = monsters.add_monster(&players).await;

        assert_eq!(monster.position, Point::new(0.0, 0.0));
        assert_eq!(monster.health, 100);
        assert_eq!(monster.patrol_path.len(), 4);
        assert_eq!(monster.target, None);
    }

    #[tokio::test]
    async fn test_remove_monster_broadcasts_despawn() {
        let players = players();
        let monsters = MonsterRegistry::new(AiConfig::default());
        let monster = monsters.add_monster(&players).await;

        let (sink, mut rx) = ConnectionHandle::channel(1);
        players.add_player("alice", 30, sink, &[], None).await.unwrap();
        while rx.try_recv().is_ok() {}

        monsters.remove_monster(monster.id, &players).await.unwrap();
        let frame = rx.try_recv().unwrap();
        assert_eq!(
            decode(&frame[4..]).unwrap(),
            GameMessage::DespawnMonster {
                monster_id: monster.id
            }
        );

        assert_eq!(
            monsters.remove_monster(monster.id, &players).await.unwrap_err(),
            WorldError::MonsterNotFound(monster.id)
        );
    }

    #[tokio::test]
    async fn test_dead_monsters_are_skipped() {
        let players = players();
        let monsters = MonsterRegistry::new(AiConfig::default());
        let alive = monsters.add_monster(&players).await;
        let dead = monsters.add_monster(&players).await;
        monsters.set_health(dead.id, 0).await.unwrap();

        let pass = monsters.evaluate_all(&[], Instant::now()).await;
        assert_eq!(pass.outcome.evaluated, 1);
        assert_eq!(pass.outcome.skipped, 1);
        drop(pass);

        // The live one starts patrolling; the dead one stays put.
        assert_eq!(monsters.get_monster(dead.id).await.unwrap().position, Point::default());
        assert_eq!(monsters.get_monster(alive.id).await.unwrap().patrol_index, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_despawn_waits_for_pending_pass() {
        let players = Arc::new(players());
        let monsters = Arc::new(MonsterRegistry::new(AiConfig::default()));
        let monster = monsters.add_monster(&players).await;

        let pass = monsters.evaluate_all(&[], Instant::now()).await;
        assert_eq!(pass.outcome.evaluated, 1);
        // reads are not blocked by a pending pass
        assert!(monsters.get_monster(monster.id).await.is_ok());

        let despawn = {
            let monsters = monsters.clone();
            let players = players.clone();
            let id = monster.id;
            tokio::spawn(async move { monsters.remove_monster(id, &players).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!despawn.is_finished());

        drop(pass);
        assert_eq!(despawn.await.unwrap().unwrap().id, monster.id);
        assert!(monsters.is_empty().await);
    }
}
