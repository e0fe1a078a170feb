//! Fixed-interval AI driver.
//!
//! One pass per tick: snapshot player positions, evaluate every live
//! monster's tree once under the monster write lock, then deliver the
//! collected effects through the players' outbound queues while still
//! holding it for reading. Delivery only enqueues, so a slow client never
//! delays the next pass.

use crate::behavior::Effect;
use crate::messaging::GameMessage;
use crate::server::ShutdownState;
use crate::world::World;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace};

/// Summary of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Monsters whose tree was executed
    pub evaluated: usize,
    /// Dead monsters left alone
    pub skipped: usize,
    /// Monster moves broadcast
    pub moves: usize,
    /// Attacks applied to players
    pub attacks: usize,
}

/// Drives monster AI at a fixed cadence.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    world: Arc<World>,
    period: Duration,
}

impl TickScheduler {
    pub fn new(world: Arc<World>, period: Duration) -> Self {
        Self { world, period }
    }

    /// Ticks until shutdown is initiated.
    ///
    /// Late ticks are skipped rather than bunched up.
    pub async fn run(self, shutdown: ShutdownState) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick_count: u64 = 0;
        info!("🕒 AI tick loop started with interval: {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait() => break,
            }
            if shutdown.is_shutdown_initiated() {
                break;
            }

            tick_count += 1;
            let report = self.tick(Instant::now()).await;
            trace!("🕒 Tick {}: {:?}", tick_count, report);
        }

        info!("✅ AI tick loop stopped after {} ticks", tick_count);
    }

    /// Runs one evaluation pass as of `now`.
    pub async fn tick(&self, now: Instant) -> TickReport {
        let positions = self.world.players().list_positions().await;
        let mut pass = self.world.monsters().evaluate_all(&positions, now).await;

        let mut report = TickReport {
            evaluated: pass.outcome.evaluated,
            skipped: pass.outcome.skipped,
            ..TickReport::default()
        };

        // `pass` holds off despawns until every effect is enqueued
        for effect in std::mem::take(&mut pass.outcome.effects) {
            match effect {
                Effect::MonsterMoved { monster_id, position } => {
                    let message = GameMessage::MonsterMove {
                        monster_id,
                        x: position.x,
                        z: position.z,
                    };
                    self.world.players().broadcast_all(&message).await;
                    report.moves += 1;
                }
                Effect::PlayerAttacked {
                    monster_id,
                    target,
                    damage,
                } => {
                    if self
                        .world
                        .players()
                        .apply_damage(target, monster_id, damage)
                        .await
                        .is_some()
                    {
                        report.attacks += 1;
                    }
                }
            }
        }
        drop(pass);
        report
    }
}
