//! Criterion benchmarks for the button-press path of [`VideoWall`].
//!
//! Every panel press is followed by a full layout recalculation and every
//! input press by a routing pass, so these are the operations a busy control
//! surface hammers.
//!
//! Run with:
//! ```bash
//! cargo bench --package videowall-core --bench wall_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use videowall_core::protocol::messages::{WallMessage, WallStateMessage};
use videowall_core::protocol::{decode_message, encode_message};
use videowall_core::{VideoWall, WallDimensions};

/// Builds a `size × size` wall with every panel high.
fn full_selection(size: u16) -> VideoWall {
    let dims = WallDimensions::new(size, size).expect("valid dimensions");
    let mut wall = VideoWall::new(dims);
    // Snake through the rows so every press is adjacent to the previous one.
    for y in 0..size {
        for i in 0..size {
            let x = if y % 2 == 0 { i } else { size - 1 - i };
            wall.set_panel(y * size + x + 1).expect("valid panel");
        }
    }
    wall
}

fn bench_panel_press_and_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("panel_press_and_layout");
    for size in [2u16, 4, 9] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut wall = full_selection(size);
            b.iter(|| {
                // Toggle panel 1 off and on again, recalculating each time.
                wall.set_panel(black_box(1)).unwrap();
                wall.calculate_high_panel_layout();
                wall.set_panel(black_box(1)).unwrap();
                wall.calculate_high_panel_layout();
            });
        });
    }
    group.finish();
}

fn bench_route_source(c: &mut Criterion) {
    let mut wall = full_selection(9);
    c.bench_function("route_source_81_panels", |b| {
        b.iter(|| wall.route_source_to_high_panels(black_box(3)))
    });
}

fn bench_snapshot_codec(c: &mut Criterion) {
    let mut wall = full_selection(9);
    wall.calculate_high_panel_layout();
    let msg = WallMessage::WallState(WallStateMessage::from_wall(&wall, 3));
    let bytes = encode_message(&msg, 0, 0).expect("encode");

    c.bench_function("encode_wall_state_81_panels", |b| {
        b.iter(|| encode_message(black_box(&msg), 0, 0).unwrap())
    });
    c.bench_function("decode_wall_state_81_panels", |b| {
        b.iter(|| decode_message(black_box(&bytes)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_panel_press_and_layout,
    bench_route_source,
    bench_snapshot_codec
);
criterion_main!(benches);
