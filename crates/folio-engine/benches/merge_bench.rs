// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the folio-engine crate: grouping pending pages
// into chunks, and a full merge through the lopdf codec.

use std::path::PathBuf;
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Document, Object, Stream, dictionary};

use folio_core::{Angle, File, NoPassword, OpenOption, Page, PdfFile, Resolution, Size};
use folio_document::{DocumentReader, LopdfCodec};
use folio_engine::Merger;
use folio_engine::merge::chunks;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn file(name: &str, count: u32) -> Arc<File> {
    Arc::new(File::Pdf(PdfFile {
        full_name: PathBuf::from(name),
        length: 0,
        count,
        resolution: Resolution::PDF,
        password: String::new(),
        full_access: true,
    }))
}

/// 1000 pages alternating between three sources in runs of 1 to 4 pages.
fn interleaved_pages() -> Vec<Page> {
    let files = [file("a.pdf", 500), file("b.pdf", 500), file("c.pdf", 500)];
    let mut pages = Vec::with_capacity(1000);
    let mut run = 0;
    while pages.len() < 1000 {
        let source = &files[run % files.len()];
        for _ in 0..=run % 4 {
            let number = pages.len() as u32 % 500 + 1;
            let page = Page::new(Arc::clone(source), number, Size::new(612.0, 792.0), Angle::ZERO)
                .expect("page in range");
            pages.push(page);
        }
        run += 1;
    }
    pages
}

fn sample_pdf(path: &std::path::Path, count: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (1..=count)
        .map(|n| {
            let content = Stream::new(
                lopdf::Dictionary::new(),
                format!("BT 72 720 Td (Page {n}) Tj ET").into_bytes(),
            );
            let content_id = doc.add_object(content);
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("save sample pdf");
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Grouping 1000 interleaved pages into same-source chunks.
fn bench_chunking(c: &mut Criterion) {
    let pages = interleaved_pages();
    c.bench_function("chunks (1000 pages)", |b| {
        b.iter(|| black_box(chunks(black_box(&pages)).len()));
    });
}

/// Merging two 20-page documents, interleaved page by page.
fn bench_merge(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    let out = dir.path().join("merged.pdf");
    sample_pdf(&first, 20);
    sample_pdf(&second, 20);

    let options = OpenOption::default();
    let a = DocumentReader::open(&first, "", &options, &NoPassword).expect("open first");
    let b = DocumentReader::open(&second, "", &options, &NoPassword).expect("open second");
    let interleaved: Vec<Page> = a
        .pages
        .iter()
        .zip(b.pages.iter())
        .flat_map(|(x, y)| [x.clone(), y.clone()])
        .collect();

    c.bench_function("merge (40 interleaved pages)", |bench| {
        bench.iter(|| {
            let mut merger = Merger::new(LopdfCodec::new());
            merger.add_pages(interleaved.iter().cloned());
            merger.save(&out).expect("merge");
        });
    });
}

criterion_group!(benches, bench_chunking, bench_merge);
criterion_main!(benches);
