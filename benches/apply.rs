//! Benchmarks for event application throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mbo_book_engine::{Action, BookEngine, EngineConfig, Event, Side};

fn create_event_stream(count: usize) -> Vec<Event> {
    let mut events = Vec::with_capacity(count);
    let base_price: i64 = 100_000_000_000; // $100.00
    let mut sequence = 0u64;
    let mut live = 0u64;

    for i in 0..count {
        sequence += 1;
        let order_id = (i + 1) as u64;
        let is_bid = i % 2 == 0;
        let price_offset = ((i % 10) as i64) * 10_000_000; // $0.01 increments

        let price = if is_bid {
            base_price - price_offset
        } else {
            base_price + 10_000_000 + price_offset
        };
        let side = if is_bid { Side::Bid } else { Side::Ask };

        // Mostly adds with a sprinkling of cancels and fills against
        // earlier orders, roughly the shape of a live MBO stream.
        match i % 10 {
            7 if live > 2 => {
                events.push(Event::new(sequence, Action::Cancel, side, live - 2, 0, 0));
            }
            9 if live > 1 => {
                events.push(Event::new(sequence, Action::Fill, side, live - 1, price, 1));
            }
            _ => {
                live = order_id;
                events.push(Event::new(
                    sequence,
                    Action::Add,
                    side,
                    order_id,
                    price,
                    ((i % 100) + 1) as u32,
                ));
            }
        }
    }

    events
}

fn bench_apply(c: &mut Criterion) {
    let events = create_event_stream(10_000);

    let mut group = c.benchmark_group("apply");
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("event_stream", |b| {
        b.iter(|| {
            let mut book =
                BookEngine::with_config(EngineConfig::new().with_logging(false));
            for event in &events {
                let _ = black_box(book.apply(event));
            }
        })
    });

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let events = create_event_stream(1_000);
    let mut book = BookEngine::with_config(EngineConfig::new().with_logging(false));
    for event in &events {
        let _ = book.apply(event);
    }

    let mut group = c.benchmark_group("queries");

    group.bench_function("best_bid", |b| b.iter(|| black_box(book.best_bid())));

    group.bench_function("top_of_book", |b| b.iter(|| black_box(book.top_of_book())));

    group.bench_function("depth_10", |b| {
        b.iter(|| black_box(book.depth(Side::Bid, 10)))
    });

    group.bench_function("snapshot", |b| b.iter(|| black_box(book.snapshot())));

    group.finish();
}

criterion_group!(benches, bench_apply, bench_queries);
criterion_main!(benches);
