//! Symbol rendering helpers shared by the integration tests

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgba, RgbaImage};
use qrcode::{Color, QrCode};
use std::io::Cursor;

/// Pixels per module
pub const SCALE: u32 = 4;

/// Light modules around the symbol
pub const QUIET_ZONE: u32 = 4;

/// Render `text` as a black-on-white QR symbol
pub fn symbol(text: &str) -> GrayImage {
    symbol_with_quiet_zone(text, QUIET_ZONE)
}

/// Render `text` with a custom quiet zone, in modules
pub fn symbol_with_quiet_zone(text: &str, quiet: u32) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("text fits in a QR symbol");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * quiet) * SCALE;

    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside = (quiet..quiet + modules).contains(&mx) && (quiet..quiet + modules).contains(&my);
        if inside && colors[((my - quiet) * modules + (mx - quiet)) as usize] == Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Two images next to each other on a white canvas
pub fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let gap = SCALE * 8;
    let width = left.width() + gap + right.width();
    let height = left.height().max(right.height());
    let mut canvas = GrayImage::from_pixel(width, height, Luma([255]));
    image::imageops::overlay(&mut canvas, left, 0, 0);
    image::imageops::overlay(&mut canvas, right, (left.width() + gap) as i64, 0);
    canvas
}

/// Swap dark and light
pub fn inverted(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    image::imageops::invert(&mut out);
    out
}

/// Dark modules opaque, everything else fully transparent black
pub fn transparent_symbol(text: &str) -> RgbaImage {
    let gray = symbol(text);
    RgbaImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Encode as PNG
pub fn png(img: DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .expect("PNG encoding succeeds");
    out.into_inner()
}

/// Encode a grayscale image as PNG
pub fn gray_png(img: &GrayImage) -> Vec<u8> {
    png(DynamicImage::ImageLuma8(img.clone()))
}
