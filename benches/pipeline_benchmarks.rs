use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, RgbImage};
use whitebg::{
    remove_background_to_vec, BackgroundRemovalProcessor, DetectorPolicy, ImageIOService,
    OutputFormat, RemovalConfig,
};

/// Synthetic portrait: noisy beige backdrop with an ellipse of warm tones
fn synthetic_portrait(width: u32, height: u32) -> RgbImage {
    let mut seed = 0x9e37_79b9_u32;
    let (cx, cy) = (width as f32 / 2.0, height as f32 * 0.6);
    let (rx, ry) = (width as f32 * 0.25, height as f32 * 0.4);

    RgbImage::from_fn(width, height, |x, y| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let noise = ((seed >> 24) % 5) as u8;
        let dx = (x as f32 - cx) / rx;
        let dy = (y as f32 - cy) / ry;
        if dx * dx + dy * dy <= 1.0 {
            image::Rgb([200 + noise, 150 + noise, 120 + noise])
        } else {
            image::Rgb([225 + noise, 215 + noise, 205 + noise])
        }
    })
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for size in [128u32, 512, 1024] {
        let samples = synthetic_portrait(size, size).into_raw();
        group.throughput(Throughput::Elements(u64::from(size * size)));

        for policy in [DetectorPolicy::Saturation, DetectorPolicy::SaturationUniformity] {
            let config = RemovalConfig::builder().detector(policy).build().unwrap();
            group.bench_with_input(
                BenchmarkId::new(policy.to_string(), size),
                &samples,
                |b, samples| {
                    b.iter(|| {
                        remove_background_to_vec(
                            black_box(samples),
                            size as usize,
                            size as usize,
                            3,
                            &config,
                        )
                        .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_encode_decode(c: &mut Criterion) {
    let image = DynamicImage::ImageRgb8(synthetic_portrait(512, 512));
    let jpeg = ImageIOService::encode_to_vec(&image, OutputFormat::Jpeg, 90).unwrap();
    let mut processor = BackgroundRemovalProcessor::new(RemovalConfig::default()).unwrap();

    c.bench_function("process_bytes_jpeg_512", |b| {
        b.iter(|| processor.process_bytes(black_box(&jpeg)).unwrap());
    });

    let result = processor.process_bytes(&jpeg).unwrap();
    let mut group = c.benchmark_group("encode");
    for format in [OutputFormat::Jpeg, OutputFormat::Png] {
        group.bench_function(format!("{format:?}"), |b| {
            b.iter(|| result.to_bytes(format, 90).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_encode_decode);
criterion_main!(benches);
