//! Criterion benchmarks for the progression engine.
//!
//! - `recompute_bundled`: full stat recompute over the 47-node bundled tree
//!   with every node researched.
//! - `click_bundled`: one click handler pass, including achievement evaluation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use evoclick_core::stats::recompute;
use evoclick_data::bundled;
use evoclick_engine::GameContext;
use evoclick_storage::MemoryStore;

fn bench_recompute(c: &mut Criterion) {
    let data = bundled().expect("bundled content loads");
    let mut state = evoclick_core::state::SaveState::new(0);
    for node in data.catalog.nodes() {
        state.set_level(node.id.clone(), node.max_level.min(10));
    }

    c.bench_function("recompute_bundled", |b| {
        b.iter(|| recompute(black_box(&data.catalog), black_box(&state), &data.balance))
    });
}

fn bench_click(c: &mut Criterion) {
    let mut ctx = GameContext::with_bundled_content(MemoryStore::new(), 0)
        .expect("bundled content loads");
    ctx.events_mut().suppress(evoclick_core::event::GameEventKind::Sound);

    c.bench_function("click_bundled", |b| {
        b.iter(|| {
            ctx.on_click();
            ctx.drain_events();
        })
    });
}

criterion_group!(benches, bench_recompute, bench_click);
criterion_main!(benches);
