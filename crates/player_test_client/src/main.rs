//! # World Server - Simulated Player Client
//!
//! Connects a number of fake players over TCP, logs each of them in and
//! walks them around at random while counting everything the server sends
//! back: other players, monster spawns and moves, damage and path previews.

use clap::Parser;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{interval, sleep, Instant};
use tracing::{error, info, warn};
use world_server::messaging::{read_message, write_message};
use world_server::{GameMessage, Point};

#[derive(Parser, Debug, Clone)]
#[command(name = "simulate")]
#[command(about = "Simulated players for the world server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    address: String,

    /// Number of simultaneous players to simulate
    #[arg(short, long, default_value = "5")]
    players: u32,

    /// Position update frequency in Hz
    #[arg(short, long, default_value = "10.0", value_parser = positive_f64)]
    frequency: f64,

    /// Simulation duration in seconds
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Side of the square area players wander in
    #[arg(short, long, default_value = "40.0", value_parser = positive_f32)]
    world_size: f32,

    /// Largest frame accepted from the server
    #[arg(long, default_value = "65536")]
    max_message_size: usize,
}

fn positive_f64(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(format!("`{value}` must be a finite number greater than 0"))
    }
}

fn positive_f32(value: &str) -> Result<f32, String> {
    let parsed: f32 = value.parse().map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(format!("`{value}` must be a finite number greater than 0"))
    }
}

/// Per-player tallies of what the server sent.
#[derive(Debug, Default)]
struct Received {
    total: AtomicU64,
    other_players: AtomicU64,
    monster_spawns: AtomicU64,
    monster_moves: AtomicU64,
    damage: AtomicU64,
    paths: AtomicU64,
}

impl Received {
    fn record(&self, message: &GameMessage) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let counter = match message {
            GameMessage::SpawnOtherPlayer { .. } => &self.other_players,
            GameMessage::SpawnMonster { .. } => &self.monster_spawns,
            GameMessage::MonsterMove { .. } => &self.monster_moves,
            GameMessage::PlayerDamaged { .. } => &self.damage,
            GameMessage::PathTest { .. } => &self.paths,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A wandering player.
#[derive(Debug)]
struct SimulatedPlayer {
    name: String,
    position: Point,
    target: Point,
    rotation_y: f32,
}

impl SimulatedPlayer {
    const SPEED: f32 = 0.5;

    fn new(name: String, spawn: Point) -> Self {
        Self {
            name,
            position: spawn,
            target: spawn,
            rotation_y: 0.0,
        }
    }

    /// Advances one step towards the current target, picking a new random
    /// target on arrival.
    fn step(&mut self, rng: &mut impl Rng, world_size: f32) {
        if self.position.distance(&self.target) < 1.0 {
            let half = world_size / 2.0;
            self.target = Point::new(rng.gen_range(-half..half), rng.gen_range(-half..half));
        }
        let next = self.position.step_towards(&self.target, Self::SPEED);
        let (dx, dz) = (next.x - self.position.x, next.z - self.position.z);
        if dx != 0.0 || dz != 0.0 {
            self.rotation_y = dx.atan2(dz).to_degrees();
        }
        self.position = next;
    }

    fn position_message(&self) -> GameMessage {
        GameMessage::PlayerPosition {
            player_id: self.name.clone(),
            x: self.position.x,
            y: 0.0,
            z: self.position.z,
            rotation_y: self.rotation_y,
        }
    }
}

async fn simulate_player(
    name: String,
    spawn: Point,
    args: Args,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let stream = TcpStream::connect(&args.address).await?;
    stream.set_nodelay(true)?;
    let (mut reader, mut writer) = stream.into_split();

    let received = Arc::new(Received::default());
    let reader_task = {
        let received = received.clone();
        let name = name.clone();
        let max_len = args.max_message_size;
        tokio::spawn(async move {
            loop {
                match read_message(&mut reader, max_len).await {
                    Ok(message) => {
                        if let GameMessage::PlayerDamaged { monster_id, health, .. } = &message {
                            info!("💥 {} hit by monster {} - health {}", name, monster_id, health);
                        }
                        received.record(&message);
                    }
                    Err(e) if e.is_disconnect() => break,
                    Err(e) => {
                        warn!("⚠️ {} dropped a frame: {}", name, e);
                        break;
                    }
                }
            }
        })
    };

    write_message(&mut writer, &GameMessage::Login { name: name.clone(), age: 20 }).await?;
    info!("🎮 {} logged in at {}", name, spawn);

    let mut player = SimulatedPlayer::new(name.clone(), spawn);
    let mut move_timer = interval(Duration::from_secs_f64(1.0 / args.frequency));
    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut sent = 0u64;

    while Instant::now() < deadline {
        move_timer.tick().await;
        player.step(&mut rand::thread_rng(), args.world_size);
        write_message(&mut writer, &player.position_message()).await?;
        sent += 1;
    }

    write_message(&mut writer, &GameMessage::Logout { player_id: name.clone() }).await?;
    if tokio::time::timeout(Duration::from_secs(2), reader_task).await.is_err() {
        warn!("⏰ {} did not see the server close the connection", name);
    }

    info!(
        "📊 {} sent {} positions, received {} messages ({} players, {} monster spawns, {} monster moves, {} hits, {} paths)",
        name,
        sent,
        received.total.load(Ordering::Relaxed),
        received.other_players.load(Ordering::Relaxed),
        received.monster_spawns.load(Ordering::Relaxed),
        received.monster_moves.load(Ordering::Relaxed),
        received.damage.load(Ordering::Relaxed),
        received.paths.load(Ordering::Relaxed),
    );
    Ok(())
}

/// Spawn points on a circle around the origin.
fn spawn_positions(count: u32, world_size: f32) -> Vec<Point> {
    let radius = world_size / 4.0;
    (0..count)
        .map(|i| {
            let angle = 2.0 * std::f32::consts::PI * (i as f32) / (count.max(1) as f32);
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("🚀 Starting player simulation");
    info!("   • Players: {}", args.players);
    info!("   • Area: {}x{}", args.world_size, args.world_size);
    info!("   • Movement: {:.1} Hz", args.frequency);
    info!("   • Duration: {} seconds", args.duration);
    info!("   • Server: {}", args.address);

    let mut handles = Vec::new();
    for (i, spawn) in spawn_positions(args.players, args.world_size).into_iter().enumerate() {
        let name = format!("sim{i}");
        let args = args.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = simulate_player(name.clone(), spawn, args).await {
                error!("❌ {} simulation failed: {}", name, e);
            }
        }));

        // Stagger connections
        sleep(Duration::from_millis(100)).await;
    }

    for handle in handles {
        let _ = handle.await;
    }

    info!("✅ Simulation complete");
    Ok(())
}
