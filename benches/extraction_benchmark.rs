//! Performance benchmarks for question extraction
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdf_quiz_server::extract::{PageElement, QuestionExtractor};
use pdf_quiz_server::pdf::{group_into_blocks, group_into_lines, CharInfo};

/// Synthetic exam page: two questions with options, answers, and one exhibit
fn synthetic_page(page: u32) -> Vec<PageElement> {
    let first = page * 2 - 1;
    let second = page * 2;
    vec![
        PageElement::text(40.0, 60.0, format!("QUESTION {}\nWhich statement is true?", first)),
        PageElement::text(70.0, 80.0, "A. The first option"),
        PageElement::text(85.0, 95.0, "B. The second option"),
        PageElement::text(100.0, 110.0, "C. The third option"),
        PageElement::text(115.0, 125.0, "Correct Answer: B"),
        PageElement::text(130.0, 160.0, "Explanation: long explanation text"),
        PageElement::image(300.0, 420.0, format!("p{}_img0.png", page)),
        PageElement::text(450.0, 470.0, format!("QUESTION {}\nRefer to the exhibit.", second)),
        PageElement::text(480.0, 490.0, "A. yes"),
        PageElement::text(495.0, 505.0, "B. no"),
        PageElement::text(510.0, 520.0, "Answer: A"),
    ]
}

fn synthetic_chars(lines: usize) -> Vec<CharInfo> {
    let text = "Which routing protocol uses TCP port 179 for peering?";
    (0..lines)
        .flat_map(|line| {
            text.chars().enumerate().filter(|(_, c)| *c != ' ').map(move |(i, c)| CharInfo {
                char: c,
                x: 50.0 + i as f32 * 6.0,
                top: 40.0 + line as f32 * 14.0,
                width: 5.0,
                height: 10.0,
            })
        })
        .collect()
}

/// Benchmark the classification pass over whole documents
fn bench_question_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("question_extraction");

    for pages in [10u32, 100, 424] {
        let document: Vec<Vec<PageElement>> = (1..=pages).map(synthetic_page).collect();
        group.throughput(Throughput::Elements(pages as u64));

        group.bench_with_input(BenchmarkId::from_parameter(pages), &document, |b, doc| {
            b.iter(|| {
                let mut extractor = QuestionExtractor::default();
                for (i, elements) in doc.iter().enumerate() {
                    extractor.process_page(i as u32 + 1, black_box(elements.clone()));
                }
                extractor.finish()
            });
        });
    }

    group.finish();
}

/// Benchmark text block reconstruction from glyphs
fn bench_block_reconstruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_reconstruction");

    for lines in [20usize, 60] {
        let chars = synthetic_chars(lines);
        group.throughput(Throughput::Elements(chars.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(lines), &chars, |b, chars| {
            b.iter(|| group_into_blocks(group_into_lines(black_box(chars.clone()))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_question_extraction, bench_block_reconstruction);
criterion_main!(benches);
