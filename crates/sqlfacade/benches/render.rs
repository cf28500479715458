use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlfacade::{BuilderState, Direction, Value, escape, fields};

/// A SELECT over `n` conditions and `n` sort items.
fn build_state(n: usize) -> BuilderState {
    let mut state = BuilderState::new();
    state.table("t");
    for i in 0..n {
        state.and_where((format!("col{i}"), format!("it's {i}")));
        state.order((format!("col{i}"), Direction::Desc));
    }
    state.limit((0, 10));
    state
}

fn bench_render_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/select");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut state = build_state(n);
            b.iter(|| black_box(state.render_select(&[])));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut state = build_state(n);
                black_box(state.render_select(&[]));
            });
        });
    }

    group.finish();
}

fn bench_render_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/insert");

    for n in [5, 20, 100] {
        let values: Vec<(String, String)> = (0..n)
            .map(|i| (format!("col{i}"), format!("O'Brien \"{i}\"")))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            let mut state = BuilderState::new();
            state.table("t");
            b.iter(|| black_box(state.render_insert(fields(values.clone()), true, false)));
        });
    }

    group.finish();
}

fn bench_escape_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/escape");

    for n in [10, 100, 1000] {
        let value = Value::List((0..n).map(|i| Value::from(format!("a'b\\{i}"))).collect());
        group.bench_with_input(BenchmarkId::from_parameter(n), &value, |b, value| {
            b.iter(|| black_box(escape(value)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_select,
    bench_build_and_render,
    bench_render_insert,
    bench_escape_nested
);
criterion_main!(benches);
