//! Benchmark for constrained random template picks.
//!
//! Assembly calls this 16 times per chunk, so it bounds generation speed.
//!
//! Run with: cargo bench --package catacomb_store --bench random_pick_benchmark

use catacomb_core::{Direction, DoorwaySet, TemplateRecord};
use catacomb_store::{RoomStore, SqliteStore};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn library(size: usize) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap().with_seed(1);
    for i in 0..size {
        // Spread doorways so every requirement has a handful of matches.
        let doors: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| (i >> (d.index() % 8)) & 1 == 1)
            .collect();
        store
            .save_template(&TemplateRecord::new(
                format!("room{i}.room"),
                format!("Room {i}"),
                DoorwaySet::of(&doors),
            ))
            .unwrap();
    }
    store
}

fn benchmark_unconstrained(c: &mut Criterion) {
    let store = library(500);
    let required: [Direction; 0] = [];
    c.bench_function("random_pick_unconstrained", |b| {
        b.iter(|| black_box(store.random_template(black_box(&required)).unwrap()));
    });
}

fn benchmark_constrained(c: &mut Criterion) {
    let store = library(500);
    let required = [Direction::N, Direction::Down];
    c.bench_function("random_pick_two_doorways", |b| {
        b.iter(|| black_box(store.random_template(black_box(&required)).unwrap()));
    });
}

fn benchmark_fallback(c: &mut Criterion) {
    // Nothing exposes every direction: each pick pays for the retry.
    let store = library(64);
    c.bench_function("random_pick_fallback", |b| {
        b.iter(|| black_box(store.random_template(black_box(&Direction::ALL)).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_unconstrained,
    benchmark_constrained,
    benchmark_fallback
);
criterion_main!(benches);
