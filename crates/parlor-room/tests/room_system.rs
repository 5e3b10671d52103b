//! Integration tests for the queue, directory and replay store together.

use parlor_protocol::{ConnectionId, RoomId};
use parlor_room::{
    Departure, FileReplayStore, MatchQueue, MemoryReplayStore, ReplayEntry, ReplayStore, Role,
    RoomDirectory, RoomError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn seeded(store: impl ReplayStore + 'static) -> RoomDirectory {
    RoomDirectory::with_rng(store, StdRng::seed_from_u64(0x5eed))
}

/// Queues `ids` in order, opening a room for every pairing.
fn queue_all(queue: &mut MatchQueue, rooms: &mut RoomDirectory, ids: &[u64]) -> Vec<RoomId> {
    let mut opened = Vec::new();
    for id in ids {
        if let Some(pairing) = queue.enqueue_or_pair(cid(*id)) {
            opened.push(rooms.open(pairing).unwrap().id());
        }
    }
    opened
}

// =========================================================================
// Queue → directory
// =========================================================================

#[test]
fn test_queue_pairs_open_rooms_in_arrival_order() {
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(MemoryReplayStore::new());

    let opened = queue_all(&mut queue, &mut rooms, &[10, 11, 12, 13, 14]);

    assert_eq!(opened, vec![RoomId(1), RoomId(2)]);
    assert_eq!(rooms.get(RoomId(1)).unwrap().players(), [cid(10), cid(11)]);
    assert_eq!(rooms.get(RoomId(2)).unwrap().players(), [cid(12), cid(13)]);
    assert_eq!(queue.waiting(), Some(cid(14)));
}

#[test]
fn test_starting_slot_is_one_of_the_pair_and_roughly_fair() {
    let mut rooms = seeded(MemoryReplayStore::new());
    let mut queue = MatchQueue::new();
    let mut first_starts = 0;
    const PAIRINGS: u64 = 1000;

    for n in 0..PAIRINGS {
        queue.enqueue_or_pair(cid(2 * n + 1));
        let pairing = queue.enqueue_or_pair(cid(2 * n + 2)).unwrap();
        let room = rooms.open(pairing).unwrap();
        let starting = room.starting_slot();

        assert!(starting == pairing.first || starting == pairing.second);
        if starting == pairing.first {
            first_starts += 1;
        }
    }

    // Binomial(1000, 0.5) stays inside 400..600 with overwhelming odds.
    assert!(
        (400..=600).contains(&first_starts),
        "first player started {first_starts} of {PAIRINGS} rooms"
    );
}

#[test]
fn test_connection_is_in_at_most_one_place() {
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(MemoryReplayStore::new());
    queue_all(&mut queue, &mut rooms, &[1, 2]);

    // An observer can't also be in another room, and a player can't observe.
    assert!(matches!(rooms.attach_observer(cid(1)), Err(RoomError::AlreadyInRoom(..))));
    rooms.attach_observer(cid(3)).unwrap();
    assert!(matches!(rooms.attach_observer(cid(3)), Err(RoomError::AlreadyInRoom(..))));

    let members: Vec<ConnectionId> = rooms.iter().flat_map(|room| room.audience()).collect();
    assert_eq!(members, vec![cid(1), cid(2), cid(3)]);
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[test]
fn test_room_survives_one_player_leaving() {
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(MemoryReplayStore::new());
    queue_all(&mut queue, &mut rooms, &[1, 2]);

    let departure = rooms.leave(cid(2)).unwrap();

    assert_eq!(departure, Departure::Left { room: RoomId(1), role: Role::Player });
    let room = rooms.find_by_participant(cid(1)).unwrap();
    assert!(room.is_vacated(1));
    assert!(!room.is_vacated(0));
    assert_eq!(room.audience(), vec![cid(1)]);
}

#[test]
fn test_room_closes_and_reports_every_remaining_observer() {
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(MemoryReplayStore::new());
    queue_all(&mut queue, &mut rooms, &[1, 2]);
    rooms.attach_observer(cid(3)).unwrap();
    rooms.attach_observer(cid(4)).unwrap();
    rooms.attach_observer(cid(5)).unwrap();
    rooms.leave(cid(4)).unwrap();

    rooms.leave(cid(1)).unwrap();
    let departure = rooms.leave(cid(2)).unwrap();

    match departure {
        Departure::Closed { room, observers, .. } => {
            assert_eq!(room, RoomId(1));
            assert_eq!(observers, vec![cid(3), cid(5)]);
        }
        other => panic!("expected room to close, got {other:?}"),
    }
    assert!(rooms.is_empty());
}

#[test]
fn test_vacated_player_can_queue_again() {
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(MemoryReplayStore::new());
    queue_all(&mut queue, &mut rooms, &[1, 2]);
    rooms.leave(cid(1)).unwrap();

    let opened = queue_all(&mut queue, &mut rooms, &[1, 3]);

    assert_eq!(opened, vec![RoomId(2)]);
    assert_eq!(rooms.find_by_participant(cid(1)).unwrap().id(), RoomId(2));
}

// =========================================================================
// Replay persistence
// =========================================================================

#[test]
fn test_moves_persist_to_per_room_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileReplayStore::new(dir.path());
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(store.clone());
    queue_all(&mut queue, &mut rooms, &[1, 2, 3, 4]);

    rooms.record_move(cid(1), ReplayEntry::new("4", "X")).unwrap();
    rooms.record_move(cid(2), ReplayEntry::new("0", "O")).unwrap();
    rooms.record_move(cid(3), ReplayEntry::new("8", "X")).unwrap();

    assert!(store.path_for(RoomId(1)).exists());
    assert!(store.path_for(RoomId(2)).exists());
    let room = rooms.get(RoomId(1)).unwrap();
    let persisted = rooms.load_replay(RoomId(1)).unwrap();
    assert_eq!(room.turn_count(), persisted.len());
    assert_eq!(persisted, room.replay());
}

#[test]
fn test_replay_outlives_closed_room() {
    let dir = tempfile::tempdir().unwrap();
    let mut queue = MatchQueue::new();
    let mut rooms = seeded(FileReplayStore::new(dir.path()));
    queue_all(&mut queue, &mut rooms, &[1, 2]);
    rooms.record_move(cid(1), ReplayEntry::new("4", "X")).unwrap();

    rooms.leave(cid(1)).unwrap();
    rooms.leave(cid(2)).unwrap();

    assert!(rooms.get(RoomId(1)).is_none());
    assert_eq!(
        rooms.load_replay(RoomId(1)).unwrap(),
        vec![ReplayEntry::new("4", "X")]
    );
}
