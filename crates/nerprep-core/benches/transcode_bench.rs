use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nerprep_core::{OutputFormat, TabularMode, TranscodeOptions, Transcoder};

fn synthetic_export(sentences: usize) -> String {
    let mut export = String::from("Cover O\npage O\n\nItem B-START\n1 O\n\n");
    for i in 0..sentences {
        export.push_str(&format!(
            "We O\nsell O\niron B-GOODS\nore I-GOODS\nand O\nlease O\nvessels B-ASSET\n{i} O\n. O\n\n"
        ));
    }
    export.push_str(". B-END\n");
    export
}

fn bench_transcode(c: &mut Criterion) {
    let export = synthetic_export(2_000);

    let bracketed = Transcoder::default();
    c.bench_function("transcode_bracketed_2k", |b| {
        b.iter(|| bracketed.run_reader(Cursor::new(black_box(&export))).unwrap());
    });

    let tabular = Transcoder::new(
        TranscodeOptions::new()
            .with_format(OutputFormat::Tabular)
            .with_tabular_mode(TabularMode::EntitiesOnly),
    );
    c.bench_function("transcode_tabular_entities_2k", |b| {
        b.iter(|| tabular.run_reader(Cursor::new(black_box(&export))).unwrap());
    });
}

criterion_group!(benches, bench_transcode);
criterion_main!(benches);
