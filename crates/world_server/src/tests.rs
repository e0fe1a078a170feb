use crate::connection::ConnectionHandle;
use crate::messaging::{decode, read_message, write_message, Frame};
use crate::navigation::{NavMesh, NavigationGateway};
use crate::*;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::Receiver;

const MESH: &str = r#"{
    "vertices": [
        {"X": -300.0, "Y": -300.0, "Z": 0.0},
        {"X": 300.0, "Y": -300.0, "Z": 0.0},
        {"X": 300.0, "Y": 300.0, "Z": 0.0},
        {"X": -300.0, "Y": 300.0, "Z": 0.0}
    ],
    "triangles": [
        {"indices": [0, 1, 2]},
        {"indices": [0, 2, 3]}
    ]
}"#;

fn drain(rx: &mut Receiver<Frame>) -> Vec<GameMessage> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(decode(&frame[4..]).unwrap());
    }
    out
}

fn world() -> World {
    World::new(ServerConfig::default(), NavigationGateway::disabled())
}

fn spawns_of_other(messages: &[GameMessage]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            GameMessage::SpawnOtherPlayer { player_id, .. } => Some(player_id.clone()),
            _ => None,
        })
        .collect()
}

async fn read(client: &mut TcpStream) -> GameMessage {
    tokio::time::timeout(Duration::from_secs(2), read_message(client, 64 * 1024))
        .await
        .expect("message in time")
        .unwrap()
}

#[tokio::test]
async fn test_two_players_see_each_other_but_not_themselves() {
    let world = world();
    let (a, mut sink_a) = ConnectionHandle::channel(1);
    let (b, mut sink_b) = ConnectionHandle::channel(2);

    world.add_player("alice", 30, a).await.unwrap();
    world.add_player("bob", 30, b).await.unwrap();

    let to_alice = drain(&mut sink_a);
    let to_bob = drain(&mut sink_b);

    assert_eq!(spawns_of_other(&to_alice), vec!["bob".to_string()]);
    assert_eq!(spawns_of_other(&to_bob), vec!["alice".to_string()]);
    assert!(matches!(to_alice[0], GameMessage::SpawnMyPlayer { .. }));
    assert!(matches!(to_bob[0], GameMessage::SpawnMyPlayer { .. }));
}

#[tokio::test]
async fn test_monster_spawn_reaches_connected_player_once() {
    let world = world();
    let (a, mut sink) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();
    drain(&mut sink);

    let monster = world.add_monster().await;

    assert_eq!(
        drain(&mut sink),
        vec![GameMessage::SpawnMonster {
            monster_id: monster.id,
            x: 0.0,
            z: 0.0,
        }]
    );
}

#[tokio::test]
async fn test_login_sequence_order() {
    let world = world();
    let first = world.add_monster().await;
    let second = world.add_monster().await;
    let (a, _sink_a) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();

    let (b, mut sink_b) = ConnectionHandle::channel(2);
    world.add_player("bob", 30, b).await.unwrap();

    let to_bob = drain(&mut sink_b);
    assert_eq!(to_bob.len(), 4);
    assert!(matches!(to_bob[0], GameMessage::SpawnMyPlayer { .. }));
    assert!(matches!(to_bob[1], GameMessage::SpawnMonster { monster_id, .. } if monster_id == first.id));
    assert!(matches!(to_bob[2], GameMessage::SpawnMonster { monster_id, .. } if monster_id == second.id));
    assert!(matches!(&to_bob[3], GameMessage::SpawnOtherPlayer { player_id, .. } if player_id == "alice"));
}

#[tokio::test]
async fn test_existing_player_rotation_is_sent_to_newcomer() {
    let world = world();
    let (a, _sink_a) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();
    world
        .move_player(registry::PlayerMove {
            name: "alice".to_string(),
            position: Point::new(1.0, 2.0),
            vertical_offset: 0.5,
            rotation_y: 180.0,
        })
        .await;

    let (b, mut sink_b) = ConnectionHandle::channel(2);
    world.add_player("bob", 30, b).await.unwrap();
    let to_bob = drain(&mut sink_b);
    assert_eq!(
        to_bob[1],
        GameMessage::SpawnOtherPlayer {
            player_id: "alice".to_string(),
            x: 1.0,
            y: 0.5,
            z: 2.0,
            rotation_y: 180.0,
        }
    );
}

#[tokio::test]
async fn test_remove_unknown_player_is_not_found() {
    let world = world();
    assert_eq!(
        world.remove_player("nobody").await.unwrap_err(),
        WorldError::PlayerNotFound("nobody".to_string())
    );
}

#[tokio::test]
async fn test_unknown_player_move_is_ignored() {
    let world = world();
    let (a, mut sink) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();
    drain(&mut sink);

    world
        .move_player(registry::PlayerMove {
            name: "ghost".to_string(),
            position: Point::new(1.0, 1.0),
            vertical_offset: 0.0,
            rotation_y: 0.0,
        })
        .await;
    assert!(drain(&mut sink).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_uniqueness_under_concurrent_logins() {
    let world = Arc::new(world());
    let mut tasks = Vec::new();
    for i in 0..32usize {
        let world = world.clone();
        tasks.push(tokio::spawn(async move {
            let (handle, _rx) = ConnectionHandle::channel(i);
            // Every name is requested twice.
            let name = format!("player{}", i % 16);
            world.add_player(&name, 20, handle).await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 16);

    let players = world.list_players().await;
    let mut ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_uniqueness_under_concurrent_login_and_logout() {
    let world = Arc::new(world());
    let mut tasks = Vec::new();
    for i in 0..32usize {
        let world = world.clone();
        tasks.push(tokio::spawn(async move {
            let name = format!("player{}", i % 8);
            let mut granted = Vec::new();
            for _ in 0..25 {
                let (handle, _rx) = ConnectionHandle::channel(i);
                match world.add_player(&name, 20, handle).await {
                    Ok(player) => {
                        // while we hold the name nobody else can log in with it
                        assert_eq!(world.get_player(&name).await.unwrap().id, player.id);
                        tokio::task::yield_now().await;
                        let removed = world.remove_player(&name).await.unwrap();
                        assert_eq!(removed.id, player.id);
                        granted.push(player.id);
                    }
                    Err(e) => assert_eq!(e, WorldError::NameTaken(name.clone())),
                }
                tokio::task::yield_now().await;
            }
            granted
        }));
    }

    let mut ids: Vec<PlayerId> = Vec::new();
    for task in tasks {
        ids.extend(task.await.unwrap());
    }
    assert!(!ids.is_empty());

    // every successful login got a fresh id, and every one was matched by a logout
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert!(world.list_players().await.is_empty());
    assert!(world.players().is_empty().await);
}

#[tokio::test]
async fn test_path_preview_follows_own_spawn() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MESH.as_bytes()).unwrap();
    let world = World::new(ServerConfig::default(), NavigationGateway::load(file.path()));

    let (a, mut sink) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();
    let messages = drain(&mut sink);

    assert!(matches!(messages[0], GameMessage::SpawnMyPlayer { .. }));
    let GameMessage::PathTest { paths } = &messages[1] else {
        panic!("expected a path preview, got {:?}", messages[1]);
    };
    assert_eq!(paths.first(), Some(&NavV3 { x: -230.0, y: 0.0, z: -291.0 }));
    assert_eq!(paths.last(), Some(&NavV3 { x: 235.0, y: 0.0, z: 180.0 }));
}

#[tokio::test]
async fn test_no_preview_when_navigation_disabled_or_unroutable() {
    let world = world();
    let (a, mut sink) = ConnectionHandle::channel(1);
    world.add_player("alice", 30, a).await.unwrap();
    assert_eq!(drain(&mut sink).len(), 1);

    let mut config = ServerConfig::default();
    config.navigation.preview_to = [10_000.0, 0.0, 10_000.0];
    let world = World::new(
        config,
        NavigationGateway::from_mesh(NavMesh::from_json(MESH).unwrap()),
    );
    let (b, mut sink) = ConnectionHandle::channel(2);
    world.add_player("bob", 30, b).await.unwrap();
    assert_eq!(drain(&mut sink).len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_over_tcp() {
    let mut config = ServerConfig::default();
    config.bind_address = "127.0.0.1:0".parse().unwrap();
    let server = Arc::new(WorldServer::with_navigation(config, NavigationGateway::disabled()));
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownState::new();

    let serving = {
        let server = server.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.serve(listener, shutdown).await })
    };

    let world = server.world();
    world.add_monster().await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    write_message(
        &mut client,
        &GameMessage::Login {
            name: "alice".to_string(),
            age: 30,
        },
    )
    .await
    .unwrap();

    assert!(matches!(read(&mut client).await, GameMessage::SpawnMyPlayer { .. }));
    assert!(matches!(read(&mut client).await, GameMessage::SpawnMonster { .. }));

    // The tick loop keeps the monster busy: patrolling, chasing or hitting alice.
    assert!(matches!(
        read(&mut client).await,
        GameMessage::MonsterMove { .. } | GameMessage::PlayerDamaged { .. }
    ));

    shutdown.initiate_shutdown();
    tokio::time::timeout(Duration::from_secs(2), serving)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
    assert!(world.players().is_empty().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_removes_players_of_closed_connections() {
    let mut config = ServerConfig::default();
    config.bind_address = "127.0.0.1:0".parse().unwrap();
    let server = WorldServer::with_navigation(config, NavigationGateway::disabled());
    let listener = server.bind().await.unwrap();
    let world = server.world();
    let connections = server.connection_manager();

    // A session with no worker behind it; only the server cleanup can end it.
    let (writer, _peer) = tokio::io::duplex(64 * 1024);
    let handle = connections
        .add_connection("127.0.0.1:40001".parse().unwrap(), writer)
        .await;
    world.add_player("alice", 30, handle.clone()).await.unwrap();
    connections.set_player_name(handle.id(), "alice").await;

    let shutdown = ShutdownState::new();
    shutdown.initiate_shutdown();
    tokio::time::timeout(Duration::from_secs(2), server.serve(listener, shutdown))
        .await
        .expect("server should stop")
        .unwrap();

    assert_eq!(connections.connection_count().await, 0);
    assert!(world.get_player("alice").await.is_err());
    assert!(world.players().is_empty().await);
}
