use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use drama_catalog_rs::{
    config::PLACEHOLDER_COVER,
    normalize::{
        envelope::unwrap_list,
        episode::build_episode_list,
        item::map_items,
    },
};

fn feed_payload(len: usize) -> Value {
    let list: Vec<Value> = (0..len)
        .map(|i| {
            json!({
                "bookId": format!("4100010{i:04}"),
                "bookName": format!("Drama {i}"),
                "coverWap": format!("https://cdn.example/cover/{i}.jpg"),
                "tags": ["Romansa", "CEO", "Balas Dendam"],
                "introduction": "Baris pertama\\nBaris kedua<br/>Baris ketiga",
                "chapterCount": 80,
            })
        })
        .collect();
    json!({ "success": true, "data": { "total": len, "list": list } })
}

fn chapter_payload(len: usize) -> Vec<Value> {
    (0..len)
        .rev()
        .map(|i| match i % 3 {
            0 => json!({ "chapterIndex": i, "chapterTitle": format!("Episode {}", i + 1) }),
            1 => json!({ "episode": (i + 1).to_string() }),
            _ => json!({ "title": format!("EP {}", i + 1) }),
        })
        .collect()
}

fn bench_normalization(c: &mut Criterion) {
    let feed = feed_payload(200);
    let chapters = chapter_payload(100);

    let mut group = c.benchmark_group("Normalization");

    group.bench_function("unwrap_list + map_items", |b| {
        b.iter(|| map_items(unwrap_list(black_box(&feed)), PLACEHOLDER_COVER))
    });

    group.bench_function("build_episode_list", |b| {
        b.iter(|| build_episode_list(black_box(&chapters)))
    });

    group.finish();
}

criterion_group!(benches, bench_normalization);
criterion_main!(benches);
