//! Benchmarks for Markdown conversion.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use bmark_converter::{ConversionOptions, Converter};

/// Generate a document with headers, lists, code and a table per section.
fn generate_markdown(sections: usize, paragraphs_per_section: usize) -> String {
    let mut md = String::with_capacity(sections * (300 + paragraphs_per_section * 120));
    md.push_str("# Document Title\n\n");

    for i in 0..sections {
        md.push_str(&format!("## Section {i}\n\n"));
        for j in 0..paragraphs_per_section {
            md.push_str(&format!(
                "Paragraph {j} of section {i} has **bold**, *italic*, `code` and a [link](http://example.com/{i}/{j}).\n\n"
            ));
        }
        md.push_str("- first item\n- second item\n  - nested item\n\n");
        md.push_str("```rust\nfn main() {}\n```\n\n");
        md.push_str("| a | b |\n|:--|--:|\n| 1 | 2 |\n\n");
    }
    md
}

fn converter() -> Converter {
    Converter::new(ConversionOptions {
        tables: true,
        strikethrough: true,
        tasklists: true,
        ..Default::default()
    })
    .unwrap()
}

fn bench_convert_simple(c: &mut Criterion) {
    let converter = converter();
    c.bench_function("convert_simple_markdown", |b| {
        b.iter(|| converter.to_html("# Hello\n\nSimple *content*."));
    });
}

fn bench_convert_varying_sizes(c: &mut Criterion) {
    let converter = converter();
    let mut group = c.benchmark_group("convert_by_size");

    for (sections, paragraphs) in [(5, 2), (20, 3), (50, 5)] {
        let markdown = generate_markdown(sections, paragraphs);
        group.throughput(Throughput::Bytes(markdown.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("markdown", format!("{sections}s_{paragraphs}p")),
            &markdown,
            |b, md| b.iter(|| converter.to_html(md)),
        );
    }

    group.finish();
}

fn bench_nested_lists(c: &mut Criterion) {
    let converter = converter();
    let mut markdown = String::new();
    for depth in 0..8 {
        markdown.push_str(&format!("{}- level {depth}\n", "  ".repeat(depth)));
    }

    c.bench_function("convert_nested_lists_8", |b| {
        b.iter(|| converter.to_html(&markdown));
    });
}

criterion_group!(
    benches,
    bench_convert_simple,
    bench_convert_varying_sizes,
    bench_nested_lists
);
criterion_main!(benches);
