use criterion::{criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::hint::black_box;

use nomia::{compile_filter, Direction, Library, Record, Settings, Terminal, Value};

const GENRES: [&str; 8] = [
    "action", "comedy", "drama", "fantasy", "romance", "sci-fi", "slice of life", "space",
];

fn library(size: u64) -> Library {
    let mut library = Library::new();
    for id in 0..size {
        let tags = (0..3)
            .map(|i| GENRES[((id + i * 3) % GENRES.len() as u64) as usize].to_string())
            .collect();
        let record = Record::new()
            .with("title", Value::Text(format!("Entry {}", id)))
            .with("tags", Value::Tags(tags))
            .with("score_overall", Value::Score((id % 11) as u8))
            .with("episode_length", Value::Duration(20 * 60 + id % 600));
        library.insert(id, record);
    }
    library
}

fn filter_benchmark(c: &mut Criterion) {
    let settings = Settings::default();
    let fields = settings.field_table();
    let library = library(10_000);
    let expr = compile_filter(
        "#space, -#romance | score_overall: >7, episode_length: <25m",
        &HashMap::new(),
    )
    .expect("filter compiles");

    c.bench_function("compile filter", |b| {
        b.iter(|| compile_filter(black_box("(#sci-fi | #space), -#dra*, title: entry"), &HashMap::new()))
    });
    c.bench_function("filter 10k entries", |b| {
        b.iter(|| library.filter(black_box(&expr), &fields).expect("filter runs"))
    });
}

fn completion_benchmark(c: &mut Criterion) {
    let settings = Settings::default();
    let mut terminal = Terminal::new(library(10_000), &settings).expect("terminal");
    c.bench_function("complete tag", |b| {
        b.iter(|| {
            terminal.reset_suggestions();
            terminal.autocomplete(black_box("f #space, #s"), 12, Direction::Forward)
        })
    });
}

criterion_group!(benches, filter_benchmark, completion_benchmark);
criterion_main!(benches);
