use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Rasterize one line of text into a tight premultiplied pixmap.
///
/// Glyphs are laid out with kerning on a shared baseline, the union of their
/// pixel bounds sizes the pixmap, then coverage is written as premultiplied
/// color (max-coverage where outlines touch).
pub fn render_text_pixmap(text: &str, font_size: f32, font: &FontVec, color: [u8; 4]) -> Pixmap {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
        }
    }

    // Whitespace-only input still needs a valid pixmap.
    if min_x == f32::INFINITY {
        return Pixmap::new(1, 1).expect("pixmap");
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h).expect("pixmap");

    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();

    for g in &glyphs {
        if let Some(out) = font.outline_glyph(g.clone()) {
            let b = out.px_bounds();
            out.draw(|x, y, cov| {
                if cov <= f32::EPSILON {
                    return;
                }
                let ix = (x as f32 + b.min.x - min_x).floor() as i32;
                let iy = (y as f32 + b.min.y - min_y).floor() as i32;
                if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                    return;
                }
                let i = iy as usize * stride + ix as usize;

                let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
                let px = PremultipliedColorU8::from_rgba(
                    (color[0] as f32 * a) as u8,
                    (color[1] as f32 * a) as u8,
                    (color[2] as f32 * a) as u8,
                    (a * 255.0) as u8,
                );
                if let Some(px) = px {
                    // Keep the heavier coverage where outlines overlap.
                    if px.alpha() > dst[i].alpha() {
                        dst[i] = px;
                    }
                }
            });
        }
    }

    pm
}
