//! Benchmarks for the per-keystroke wire path.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use notemirror::note::raw::{convert_from_raw, convert_to_raw};
use notemirror::note::{InlineStyle, NoteContent, NoteSurface, RichDocument};

fn shopping_list(lines: usize) -> RichDocument {
    let text = (0..lines)
        .map(|i| format!("item {i}: milk, eggs, bread and a little something for later"))
        .collect::<Vec<_>>()
        .join("\n");
    let mut doc = RichDocument::from_plain(&text);
    for idx in (0..lines).step_by(2) {
        doc.toggle_style(idx, &InlineStyle::Bold);
    }
    for idx in (0..lines).step_by(3) {
        doc.cycle_block_type(idx);
    }
    doc
}

fn bench_convert_to_raw(c: &mut Criterion) {
    let doc = shopping_list(200);
    c.bench_function("convert_to_raw_200", |b| {
        b.iter(|| convert_to_raw(black_box(&doc)))
    });
}

fn bench_convert_from_raw(c: &mut Criterion) {
    let raw = convert_to_raw(&shopping_list(200));
    c.bench_function("convert_from_raw_200", |b| {
        b.iter(|| convert_from_raw(black_box(raw.clone())).unwrap())
    });
}

fn bench_keystroke(c: &mut Criterion) {
    let mut surface = NoteSurface::new(NoteContent::Rich(shopping_list(200)));
    c.bench_function("keystroke_to_wire_200", |b| {
        b.iter(|| {
            surface.insert_char('x');
            let wire = surface.to_wire();
            surface.delete_back();
            black_box(wire)
        })
    });
}

criterion_group!(
    benches,
    bench_convert_to_raw,
    bench_convert_from_raw,
    bench_keystroke
);
criterion_main!(benches);
