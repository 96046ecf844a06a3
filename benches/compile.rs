//! Benchmarks for template compilation and rendering.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use microtemplate::{compile, TemplateSettings};
use serde_json::json;

const LIST_TEMPLATE: &str = r#"<h1><%- title %></h1>
<ul>
<% for (var i = 0; i < items.length; i++) { var item = items[i]; %>
  <li class="<%= item.enabled ? 'on' : 'off' %>"><%- item.name %> (<%= item.version %>)</li>
<% } %>
</ul>"#;

/// Benchmark: compiling in both scoping modes
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("default_scope", |b| {
        b.iter(|| compile(black_box(LIST_TEMPLATE), None).unwrap());
    });

    let settings = TemplateSettings::default().with_variable("obj");
    group.bench_function("named_variable", |b| {
        b.iter(|| compile(black_box(LIST_TEMPLATE), Some(&settings)).unwrap());
    });

    group.finish();
}

/// Benchmark: rendering a precompiled template with growing data
fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let template = compile(LIST_TEMPLATE, None).unwrap();

    for num_items in [10, 100, 1000] {
        let items: Vec<serde_json::Value> = (0..num_items)
            .map(|i| {
                json!({
                    "name": format!("<module_{i}>"),
                    "version": format!("{}.{}.{}", i / 10, i % 10, i % 5),
                    "enabled": i % 2 == 0,
                })
            })
            .collect();
        let data = json!({"title": "Modules & friends", "items": items});

        group.throughput(Throughput::Elements(num_items as u64));
        group.bench_with_input(BenchmarkId::new("items", num_items), &data, |b, data| {
            b.iter(|| template.render(black_box(data)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_render);
criterion_main!(benches);
