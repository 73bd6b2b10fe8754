//! A tiny 3x5 bitmap font for score labels: digits, a few letters and
//! the punctuation the overlay prints.

use image::{Rgb, RgbImage};

const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

/// Height in pixels of one line of text at `scale`.
pub fn line_height(scale: u32) -> u32 {
    (GLYPH_H + 1) * scale
}

pub fn measure_text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * (GLYPH_W + 1) * scale
}

pub fn draw_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: u32) {
    let mut cx = x;
    for c in text.chars() {
        draw_char(canvas, cx, y, c, color, scale);
        cx += ((GLYPH_W + 1) * scale) as i32;
    }
}

// Each row is 3 bits, highest bit is the leftmost column.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        ':' => [0x0, 0x2, 0x0, 0x2, 0x0],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '%' => [0x5, 0x1, 0x2, 0x4, 0x5],
        's' => [0x0, 0x3, 0x6, 0x3, 0x6],
        'c' => [0x0, 0x3, 0x4, 0x4, 0x3],
        'o' => [0x0, 0x2, 0x5, 0x5, 0x2],
        'r' => [0x0, 0x6, 0x5, 0x4, 0x4],
        'e' => [0x0, 0x2, 0x7, 0x4, 0x3],
        'f' => [0x3, 0x4, 0x6, 0x4, 0x4],
        'a' => [0x0, 0x3, 0x5, 0x5, 0x3],
        'm' => [0x0, 0x5, 0x7, 0x5, 0x5],
        'k' => [0x4, 0x5, 0x6, 0x5, 0x5],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    }
}

fn draw_char(canvas: &mut RgbImage, x: i32, y: i32, c: char, color: Rgb<u8>, scale: u32) {
    let (width, height) = canvas.dimensions();

    for (row, bits) in glyph(c).iter().enumerate() {
        for col in 0..GLYPH_W {
            if (bits >> (GLYPH_W - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + (col * scale + dx) as i32;
                    let py = y + (row as u32 * scale + dy) as i32;
                    if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                        canvas.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_characters() {
        assert_eq!(measure_text_width("score:93.5", 1), 40);
        assert_eq!(measure_text_width("93", 2), 16);
        assert_eq!(line_height(2), 12);
    }

    #[test]
    fn draws_inside_and_clips_outside() {
        let mut canvas = RgbImage::new(4, 5);
        draw_text(&mut canvas, 0, 0, "1", Rgb([255, 255, 255]), 1);
        // Middle column of "1" is lit on every row.
        for y in 0..5 {
            assert_eq!(canvas.get_pixel(1, y), &Rgb([255, 255, 255]));
        }
        // Spacing column stays dark.
        assert_eq!(canvas.get_pixel(3, 0), &Rgb([0, 0, 0]));

        draw_text(&mut canvas, -10, -10, "88", Rgb([255, 0, 0]), 3);
        draw_text(&mut canvas, 3, 4, "8", Rgb([255, 0, 0]), 1);
    }
}
