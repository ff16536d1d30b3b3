//! Integration tests for the file-backed SQLite store.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use catacomb_core::{Chunk, ChunkKey, Direction, DoorwaySet, Room, TemplateRecord};
use catacomb_store::{RoomStore, SqliteStore};

fn temp_db_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_catacomb_store_{id}.db"))
}

#[test]
fn test_records_survive_reopen() {
    let path = temp_db_path();
    let key = ChunkKey::new("test", 0, 0);

    {
        let store = SqliteStore::open(&path).unwrap();
        let id = store
            .save_template(&TemplateRecord::new(
                "a.room",
                "A",
                DoorwaySet::of(&[Direction::N, Direction::E, Direction::Up]),
            ))
            .unwrap();
        let record = store.template(id).unwrap().unwrap();

        let mut chunk = Chunk::new(key.clone());
        for y in 0..16 {
            chunk.set_room(Room::from_template(key.room(y), &record));
        }
        store.save_chunk(&chunk).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.chunk_exists(&key).unwrap());
    let chunk = store.load_chunk(&key).unwrap().unwrap();
    assert!(chunk.is_complete());
    assert!(chunk.room(9).unwrap().has_doorway(Direction::Up));

    let templates = store.templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(
        templates[0].doorways,
        DoorwaySet::of(&[Direction::N, Direction::E, Direction::Up])
    );

    drop(store);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_concurrent_picks_and_saves() {
    let path = temp_db_path();
    let store = Arc::new(SqliteStore::open(&path).unwrap().with_seed(3));
    for i in 0..8 {
        store
            .save_template(&TemplateRecord::new(
                format!("t{i}.room"),
                format!("T{i}"),
                DoorwaySet::of(&[Direction::ALL[i]]),
            ))
            .unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut picks: HashMap<String, usize> = HashMap::new();
                for x in 0..25 {
                    let key = ChunkKey::new("test", t, x);
                    let picked = store.random_template(&[]).unwrap().unwrap();
                    let mut chunk = Chunk::new(key.clone());
                    chunk.set_room(Room::from_template(key.room(0), &picked));
                    store.save_chunk(&chunk).unwrap();
                    *picks.entry(picked.filename).or_default() += 1;
                }
                picks
            })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.join().unwrap().values().sum::<usize>();
    }
    assert_eq!(total, 100);

    for t in 0..4 {
        for x in 0..25 {
            assert!(store.chunk_exists(&ChunkKey::new("test", t, x)).unwrap());
        }
    }

    drop(store);
    std::fs::remove_file(&path).ok();
}
