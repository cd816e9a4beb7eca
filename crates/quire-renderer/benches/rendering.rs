//! Benchmarks for markdown rendering and code highlighting.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quire_renderer::{LineBreaks, MarkdownRenderer};

/// Generate a document with prose sections and fenced code samples.
fn generate_markdown(sections: usize, code_blocks_per_section: usize) -> String {
    let mut md = String::with_capacity(sections * (200 + code_blocks_per_section * 120));
    md.push_str("# Article\n\n");

    for i in 0..sections {
        md.push_str(&format!("## Section {i}\n\n"));
        md.push_str("Text with **bold**, *italic* and `inline` code. ");
        md.push_str(&format!("See [section {i}](#s{i}).\n\n"));
        md.push_str("* first point\n* second point\n\n");
        for j in 0..code_blocks_per_section {
            md.push_str(&format!(
                "```js\n// sample {j}\nconst value = \"{i}\";\nfor (let n = 0; n < {j}; n++) {{}}\n```\n\n"
            ));
        }
    }
    md
}

fn bench_render_simple(c: &mut Criterion) {
    let renderer = MarkdownRenderer::new();

    c.bench_function("render_simple_markdown", |b| {
        b.iter(|| renderer.render("# Hello\n\nSimple **content**."));
    });
}

fn bench_render_by_size(c: &mut Criterion) {
    let renderer = MarkdownRenderer::new();
    let mut group = c.benchmark_group("render_by_size");

    for (sections, blocks) in [(5, 1), (20, 2), (50, 4)] {
        let markdown = generate_markdown(sections, blocks);
        group.throughput(Throughput::Bytes(markdown.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("markdown", format!("{sections}s_{blocks}c")),
            &markdown,
            |b, md| b.iter(|| renderer.render(md)),
        );
    }

    group.finish();
}

fn bench_line_break_modes(c: &mut Criterion) {
    let markdown = generate_markdown(20, 2);
    let mut group = c.benchmark_group("line_breaks");

    for mode in [LineBreaks::OutsideBlocks, LineBreaks::All] {
        let renderer = MarkdownRenderer::new().with_line_breaks(mode);
        group.bench_with_input(BenchmarkId::from_parameter(mode.as_str()), &markdown, |b, md| {
            b.iter(|| renderer.render(md));
        });
    }

    group.finish();
}

fn bench_highlight(c: &mut Criterion) {
    let source = "const total = items.reduce((sum, x) => sum + x.price * 1.2, 0); // sum\n"
        .repeat(100);

    c.bench_function("highlight_javascript_100_lines", |b| {
        b.iter(|| quire_highlight::highlight(&source, "javascript"));
    });
}

criterion_group!(
    benches,
    bench_render_simple,
    bench_render_by_size,
    bench_line_break_modes,
    bench_highlight
);
criterion_main!(benches);
