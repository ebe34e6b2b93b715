//! Simulated picture generator.
//!
//! Produces the deterministic placeholder used when a backend is
//! configured to simulate hardware: a translucent red field with the
//! capture timestamp stamped across the center, encoded as JPEG like a
//! real capture.

use crate::errors::CameraError;
use crate::pipeline::PhotoPipeline;
use crate::types::{timestamp, CaptureKind, SavedPhoto};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::io::Cursor;

/// Canvas dimensions of the sample picture.
pub const SAMPLE_WIDTH: u32 = 3000;
pub const SAMPLE_HEIGHT: u32 = 2000;

/// 50% red over a white background, flattened (JPEG has no alpha).
const FILL: Rgb<u8> = Rgb([255, 127, 127]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;
/// Glyph cell plus one column of spacing.
const GLYPH_ADVANCE: u32 = GLYPH_COLS + 1;
/// Cap on the glyph cell size, roughly a 300px tall stamp.
const MAX_SCALE: u32 = 300 / GLYPH_ROWS;

/// Generate the sample picture for `timestamp`, JPEG-encoded.
///
/// Deterministic for a given timestamp string.
pub fn sample_picture(timestamp: &str, jpeg_quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut img = RgbImage::from_pixel(SAMPLE_WIDTH, SAMPLE_HEIGHT, FILL);
    stamp_centered(&mut img, timestamp);

    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);
    let encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(encoder)
        .map_err(|e| CameraError::CaptureFailed(format!("failed to create sample picture: {}", e)))?;
    Ok(out)
}

/// Generate a sample picture for `kind` and run it through `pipeline`
/// with the usual filename convention.
pub(crate) async fn take_sample_picture(
    pipeline: &PhotoPipeline,
    kind: CaptureKind,
) -> Result<SavedPhoto, CameraError> {
    let ts = timestamp();
    let filename = kind.filename(&ts);
    log::info!("sample picture: {}", filename);

    let quality = pipeline.jpeg_quality();
    let data = tokio::task::spawn_blocking(move || sample_picture(&ts, quality))
        .await
        .map_err(|e| CameraError::CaptureFailed(format!("sample picture task failed: {}", e)))??;

    pipeline.process(data, &filename).await
}

/// Stamp `text` centered on the image, scaled to fit its width.
fn stamp_centered(img: &mut RgbImage, text: &str) {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return;
    }

    let cols = chars.len() as u32;
    let fit = (img.width() * 9 / 10) / (cols * GLYPH_ADVANCE);
    let scale = fit.clamp(1, MAX_SCALE);

    let text_w = cols * GLYPH_ADVANCE * scale;
    let text_h = GLYPH_ROWS * scale;
    let x0 = img.width().saturating_sub(text_w) / 2;
    let y0 = img.height().saturating_sub(text_h) / 2;

    for (i, c) in chars.iter().enumerate() {
        let gx = x0 + i as u32 * GLYPH_ADVANCE * scale;
        stamp_glyph(img, *c, gx, y0, scale);
    }
}

fn stamp_glyph(img: &mut RgbImage, c: char, x0: u32, y0: u32, scale: u32) {
    let rows = glyph(c);
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_COLS {
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            let px0 = x0 + col * scale;
            let py0 = y0 + row as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let (px, py) = (px0 + dx, py0 + dy);
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, INK);
                    }
                }
            }
        }
    }
}

/// 5x7 bitmap rows, bit 4 leftmost. Timestamps only need digits and
/// separators; anything else renders blank.
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        _ => [0x00; 7],
    }
}
