//! Benchmarks for decoding and rendering a stroke page.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rm_lines::config::RenderOptions;
use rm_lines::geometry::Rect;
use rm_lines::lines::{decode, encode, Layer, Segment, Stroke, StrokeFile, Version};
use rm_lines::mapper::PageLayout;
use rm_lines::pen::PenType;
use rm_lines::render::StrokeRenderer;

/// A dense page: 200 strokes of 150 segments spread over every pen.
fn synthetic_page() -> Vec<u8> {
    let pens = [12, 14, 15, 16, 17, 18, 13, 21];
    let strokes = (0..200)
        .map(|i| {
            let pen_id = pens[i % pens.len()];
            let segments = (0..150)
                .map(|j| Segment {
                    x: (i * 7 % 1404) as f32 + j as f32 * 2.0,
                    y: (i * 9 % 1872) as f32 + (j as f32 * 0.1).sin() * 20.0,
                    speed: (j % 30) as f32,
                    tilt: 0.3,
                    width: 2.0,
                    pressure: (j % 10) as f32 / 10.0,
                })
                .collect();
            Stroke {
                pen_id,
                pen: PenType::from_id(pen_id),
                color: (i % 3) as u32,
                reserved: 0,
                base_width: 2.0,
                extra: Some(0.0),
                segments,
            }
        })
        .collect();
    encode(&StrokeFile {
        version: Version::V5,
        layers: vec![Layer {
            strokes,
            color_override: None,
        }],
    })
    .unwrap_or_default()
}

fn bench_decode(c: &mut Criterion) {
    let bytes = synthetic_page();
    c.bench_function("decode_page", |b| b.iter(|| decode(black_box(&bytes))));
}

fn bench_render(c: &mut Criterion) {
    let page = match decode(&synthetic_page()) {
        Ok(page) => page,
        Err(e) => panic!("synthetic page does not decode: {}", e),
    };
    let options = RenderOptions::default();
    let layout = PageLayout::from_box(Rect::new(0.0, 0.0, 612.0, 792.0)).unwrap_or(PageLayout::native(false));
    let renderer = StrokeRenderer::new(layout, &options);

    c.bench_function("render_page", |b| b.iter(|| renderer.render(black_box(&page))));
    c.bench_function("render_page_to_content", |b| {
        b.iter(|| renderer.render(black_box(&page)).to_content())
    });
}

criterion_group!(benches, bench_decode, bench_render);
criterion_main!(benches);
