use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::{Color, QrCode};
use rust_qr_web::Scanner;
use std::io::Cursor;

const SCALE: u32 = 6;

fn symbol_png(text: &str, canvas: u32) -> Vec<u8> {
    let code = QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let img = GrayImage::from_fn(canvas, canvas, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        if mx < modules && my < modules && colors[(my * modules + mx) as usize] == Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    });
    let mut shifted = GrayImage::from_pixel(canvas, canvas, Luma([255]));
    image::imageops::overlay(&mut shifted, &img, (4 * SCALE) as i64, (4 * SCALE) as i64);

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(shifted)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

fn bench_scan_single_symbol(c: &mut Criterion) {
    let scanner = Scanner::new();
    let bytes = symbol_png("https://example.com/benchmark", 400);
    c.bench_function("scan_single_symbol_400x400", |b| {
        b.iter(|| scanner.scan_bytes(black_box(&bytes)).unwrap())
    });
}

fn bench_scan_blank(c: &mut Criterion) {
    let scanner = Scanner::new();
    let blank = GrayImage::from_pixel(1024, 1024, Luma([255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(blank)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    let bytes = out.into_inner();
    // Exhausts all four steps, including the adaptive rebinarization
    c.bench_function("scan_blank_1024x1024", |b| {
        b.iter(|| scanner.scan_bytes(black_box(&bytes)).unwrap_err())
    });
}

criterion_group!(benches, bench_scan_single_symbol, bench_scan_blank);
criterion_main!(benches);
