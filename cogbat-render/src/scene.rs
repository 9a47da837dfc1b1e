use std::collections::HashMap;
use std::sync::Arc;

use ab_glyph::FontVec;
use anyhow::Result;
use cogbat_cache::intern_text;
use cogbat_core::{FeedbackKind, Heading, Offer, StimulusKind, TrialState};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::text::render_text_pixmap;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const DIM: [u8; 4] = [160, 160, 160, 255];
const GOOD: [u8; 4] = [64, 180, 80, 255];
const BAD: [u8; 4] = [220, 50, 47, 255];
const SLOW: [u8; 4] = [235, 200, 40, 255];

/// What the app wants on screen this frame.
pub enum Screen<'a> {
    Welcome,
    Calibrating,
    Instructions { title: &'a str, body: &'a str },
    Trial {
        state: TrialState,
        stimulus: Option<&'a StimulusKind>,
        /// Frames spent in the current trial state; animates the dot field.
        frame: u32,
        progress: (u32, u32),
        block: u32,
        feedback: Option<FeedbackKind>,
    },
    Interrupt,
    Rest,
    Debrief,
}

pub struct SceneRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    font: FontVec,
    /// Rasterized labels keyed by interned text id, size and color.
    text_cache: HashMap<(usize, u32, [u8; 4]), Arc<Pixmap>>,
}

impl SceneRenderer {
    pub fn new(width: u32, height: u32, font: FontVec) -> Self {
        Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            font,
            text_cache: HashMap::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.center = (width as f32 / 2.0, height as f32 / 2.0);
    }

    /// Compose one frame into `canvas`.
    pub fn render(&mut self, canvas: &mut Pixmap, screen: &Screen) -> Result<()> {
        canvas.fill(Color::from_rgba8(0, 0, 0, 255));
        let (cx, cy) = self.center;

        match screen {
            Screen::Welcome => {
                self.blit_text(canvas, "COGNITIVE TASK BATTERY", 44.0, WHITE, (cx, cy - 60.0));
                self.blit_text(canvas, "Press SPACE to begin", 24.0, DIM, (cx, cy + 40.0));
                self.blit_text(canvas, "ESC ends the session at any time", 18.0, DIM, (cx, cy + 90.0));
            }
            Screen::Calibrating => {
                self.blit_text(canvas, "CALIBRATING DISPLAY...", 32.0, WHITE, (cx, cy));
            }
            Screen::Instructions { title, body } => {
                self.blit_text(canvas, title, 36.0, WHITE, (cx, cy - 220.0));
                self.blit_paragraph(canvas, body, 24.0, WHITE, (cx, cy - 120.0));
                self.blit_text(canvas, "Press SPACE to start", 22.0, DIM, (cx, cy + 240.0));
            }
            Screen::Trial {
                state,
                stimulus,
                frame,
                progress,
                block,
                feedback,
            } => {
                self.draw_trial(canvas, *state, *stimulus, *frame, *feedback)?;
                self.draw_header(canvas, *progress, *block);
            }
            Screen::Interrupt => {
                self.blit_text(canvas, "Still there?", 36.0, SLOW, (cx, cy - 60.0));
                self.blit_text(
                    canvas,
                    "No responses have been registered for a while.",
                    24.0,
                    WHITE,
                    (cx, cy),
                );
                self.blit_text(
                    canvas,
                    "Press any response key to continue.",
                    22.0,
                    DIM,
                    (cx, cy + 50.0),
                );
            }
            Screen::Rest => {
                self.blit_text(canvas, "Block complete.", 32.0, WHITE, (cx, cy - 100.0));
                self.blit_text(
                    canvas,
                    "How effortful was that block?",
                    26.0,
                    WHITE,
                    (cx, cy - 20.0),
                );
                self.blit_text(
                    canvas,
                    "1 = not at all        9 = extremely",
                    22.0,
                    DIM,
                    (cx, cy + 40.0),
                );
                self.blit_text(canvas, "Press a number key.", 22.0, DIM, (cx, cy + 90.0));
            }
            Screen::Debrief => {
                self.blit_text(canvas, "All tasks complete.", 36.0, WHITE, (cx, cy - 40.0));
                self.blit_text(
                    canvas,
                    "Thank you! Please let the experimenter know you are done.",
                    24.0,
                    DIM,
                    (cx, cy + 30.0),
                );
            }
        }
        Ok(())
    }

    fn draw_trial(
        &mut self,
        canvas: &mut Pixmap,
        state: TrialState,
        stimulus: Option<&StimulusKind>,
        frame: u32,
        feedback: Option<FeedbackKind>,
    ) -> Result<()> {
        match state {
            TrialState::Fixation => self.draw_fixation(canvas),
            TrialState::Response => {
                if let Some(kind) = stimulus {
                    self.draw_stimulus(canvas, kind, frame);
                }
            }
            TrialState::Feedback => {
                let (label, color) = match feedback {
                    Some(FeedbackKind::Correct) => ("correct", GOOD),
                    Some(FeedbackKind::Incorrect) => ("wrong", BAD),
                    Some(FeedbackKind::Missed) => ("too slow", SLOW),
                    Some(FeedbackKind::Noted) | None => ("ok", WHITE),
                };
                self.blit_text(canvas, label, 32.0, color, self.center);
            }
            TrialState::Interval | TrialState::Complete => {
                // Blank inter-trial interval
            }
        }
        Ok(())
    }

    fn draw_header(&mut self, canvas: &mut Pixmap, progress: (u32, u32), block: u32) {
        let (done, total) = progress;
        let trial_label = format!("Trial: {}/{}", done, total);
        self.blit_text(canvas, &trial_label, 20.0, DIM, (90.0, 30.0));
        let block_label = format!("Block {}", block);
        self.blit_text(
            canvas,
            &block_label,
            20.0,
            DIM,
            (self.width as f32 - 90.0, 30.0),
        );
    }

    fn draw_fixation(&mut self, canvas: &mut Pixmap) {
        let (cx, cy) = self.center;
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(Color::from_rgba8(255, 255, 255, 255));
        let h = Rect::from_xywh(cx - 20.0, cy - 1.0, 40.0, 2.0).unwrap();
        canvas.fill_rect(h, &paint, Transform::identity(), None);
        let v = Rect::from_xywh(cx - 1.0, cy - 20.0, 2.0, 40.0).unwrap();
        canvas.fill_rect(v, &paint, Transform::identity(), None);
    }

    fn draw_stimulus(&mut self, canvas: &mut Pixmap, kind: &StimulusKind, frame: u32) {
        let (cx, cy) = self.center;
        match kind {
            StimulusKind::Word { text, ink } => {
                self.blit_text(canvas, text, 64.0, ink.rgba(), (cx, cy));
            }
            StimulusKind::CuedDigit { cue, digit } => {
                self.blit_text(canvas, cue.prompt(), 28.0, DIM, (cx, cy - 110.0));
                self.blit_text(canvas, &digit.to_string(), 72.0, WHITE, (cx, cy));
            }
            StimulusKind::Equation { text, claimed } => {
                let line = format!("{} = {}", text, claimed);
                self.blit_text(canvas, &line, 48.0, WHITE, (cx, cy));
            }
            StimulusKind::OfferPair { easy, hard } => {
                self.draw_offer(canvas, easy, (cx - 200.0, cy), "LEFT");
                self.draw_offer(canvas, hard, (cx + 200.0, cy), "RIGHT");
            }
            StimulusKind::DotField {
                coherence,
                heading,
                seed,
            } => {
                self.draw_dot_field(canvas, *coherence, *heading, *seed, frame);
            }
            StimulusKind::SearchArray {
                target_present,
                set_size,
                seed,
            } => {
                self.draw_search_array(canvas, *target_present, *set_size, *seed);
            }
        }
    }

    fn draw_offer(&mut self, canvas: &mut Pixmap, offer: &Offer, center: (f32, f32), caption: &str) {
        let (cx, cy) = center;
        let (w, h) = (180.0, 220.0);

        let mut outline = Paint::default();
        outline.anti_alias = false;
        outline.set_color(Color::from_rgba8(160, 160, 160, 255));
        let frame_rect = Rect::from_xywh(cx - w / 2.0, cy - h / 2.0, w, h).unwrap();
        let path = PathBuilder::from_rect(frame_rect);
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        canvas.stroke_path(&path, &outline, &stroke, Transform::identity(), None);

        let reward_label = format!("+{} pts", offer.reward);
        self.blit_text(canvas, &reward_label, 28.0, WHITE, (cx, cy - h / 2.0 + 34.0));

        // Effort bar grows upward from the panel floor.
        let bar_h = offer.effort as f32 / 12.0 * 120.0;
        let mut bar = Paint::default();
        bar.anti_alias = false;
        bar.set_color(Color::from_rgba8(60, 110, 230, 255));
        let bar_rect =
            Rect::from_xywh(cx - 22.0, cy + h / 2.0 - 16.0 - bar_h, 44.0, bar_h).unwrap();
        canvas.fill_rect(bar_rect, &bar, Transform::identity(), None);

        let effort_label = format!("{} presses", offer.effort);
        self.blit_text(canvas, &effort_label, 18.0, DIM, (cx, cy + h / 2.0 + 24.0));
        self.blit_text(canvas, caption, 18.0, DIM, (cx, cy + h / 2.0 + 52.0));
    }

    fn draw_dot_field(
        &mut self,
        canvas: &mut Pixmap,
        coherence: f32,
        heading: Heading,
        seed: u64,
        frame: u32,
    ) {
        let (cx, cy) = self.center;
        let radius = 0.22 * self.width.min(self.height) as f32;
        let mut pb = PathBuilder::new();
        for (dx, dy) in dot_positions(seed, frame, coherence, 120, radius, heading) {
            pb.push_circle(cx + dx, cy + dy, 3.0);
        }
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.anti_alias = true;
            paint.set_color(Color::from_rgba8(255, 255, 255, 255));
            canvas.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn draw_search_array(
        &mut self,
        canvas: &mut Pixmap,
        target_present: bool,
        set_size: u8,
        seed: u64,
    ) {
        let (cx, cy) = self.center;
        let cell = 84.0;
        let origin = (
            cx - cell * (SEARCH_COLS as f32) / 2.0 + cell / 2.0,
            cy - cell * (SEARCH_ROWS as f32) / 2.0 + cell / 2.0,
        );

        for (i, item) in search_layout(seed, set_size).iter().enumerate() {
            let x = origin.0 + item.col as f32 * cell + item.jitter.0;
            let y = origin.1 + item.row as f32 * cell + item.jitter.1;
            let is_target = target_present && i == 0;
            self.draw_search_item(canvas, x, y, item.orientation, is_target);
        }
    }

    /// T and L items built from two bars; the orientation spins them by
    /// quarter turns so the distractors don't read as a uniform texture.
    fn draw_search_item(&self, canvas: &mut Pixmap, cx: f32, cy: f32, orientation: u8, is_target: bool) {
        let s = 26.0;
        let t = 5.0;
        let transform = Transform::from_rotate_at(orientation as f32 * 90.0, cx, cy);
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(Color::from_rgba8(255, 255, 255, 255));

        if is_target {
            // T: cap across the top, stem down the middle.
            let cap = Rect::from_xywh(cx - s / 2.0, cy - s / 2.0, s, t).unwrap();
            let stem = Rect::from_xywh(cx - t / 2.0, cy - s / 2.0, t, s).unwrap();
            canvas.fill_rect(cap, &paint, transform, None);
            canvas.fill_rect(stem, &paint, transform, None);
        } else {
            // L: stem down the left edge, foot along the bottom.
            let stem = Rect::from_xywh(cx - s / 2.0, cy - s / 2.0, t, s).unwrap();
            let foot = Rect::from_xywh(cx - s / 2.0, cy + s / 2.0 - t, s, t).unwrap();
            canvas.fill_rect(stem, &paint, transform, None);
            canvas.fill_rect(foot, &paint, transform, None);
        }
    }

    fn blit_paragraph(
        &mut self,
        canvas: &mut Pixmap,
        body: &str,
        px: f32,
        color: [u8; 4],
        top_center: (f32, f32),
    ) {
        let line_height = px * 1.6;
        for (i, line) in body.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let y = top_center.1 + i as f32 * line_height;
            self.blit_text(canvas, line.trim(), px, color, (top_center.0, y));
        }
    }

    fn blit_text(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        px: f32,
        color: [u8; 4],
        center: (f32, f32),
    ) {
        let pm = self.text_pixmap(text, px, color);
        let x = (center.0 - pm.width() as f32 / 2.0).round() as i32;
        let y = (center.1 - pm.height() as f32 / 2.0).round() as i32;
        canvas.draw_pixmap(
            x,
            y,
            (*pm).as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn text_pixmap(&mut self, text: &str, px: f32, color: [u8; 4]) -> Arc<Pixmap> {
        let key = (intern_text(text), px as u32, color);
        if let Some(pm) = self.text_cache.get(&key) {
            return Arc::clone(pm);
        }
        let pm = Arc::new(render_text_pixmap(text, px, &self.font, color));
        self.text_cache.insert(key, Arc::clone(&pm));
        pm
    }
}

const SEARCH_COLS: usize = 6;
const SEARCH_ROWS: usize = 5;

struct SearchItem {
    col: usize,
    row: usize,
    jitter: (f32, f32),
    orientation: u8,
}

/// Deterministic item placement for one search trial: shuffled grid cells
/// with per-item jitter and spin. Item 0 hosts the target when present.
fn search_layout(seed: u64, set_size: u8) -> Vec<SearchItem> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut cells: Vec<(usize, usize)> = (0..SEARCH_COLS)
        .flat_map(|c| (0..SEARCH_ROWS).map(move |r| (c, r)))
        .collect();
    cells.shuffle(&mut rng);

    cells
        .into_iter()
        .take(set_size as usize)
        .map(|(col, row)| SearchItem {
            col,
            row,
            jitter: (rng.random_range(-8.0..8.0), rng.random_range(-8.0..8.0)),
            orientation: rng.random_range(0..4),
        })
        .collect()
}

/// Dot positions relative to the aperture center for one frame.
///
/// The first `coherence * n` dots share a base layout and drift with the
/// heading, wrapping at the aperture edge; the rest are repositioned every
/// frame. Both streams are pure functions of (seed, frame).
fn dot_positions(
    seed: u64,
    frame: u32,
    coherence: f32,
    n: usize,
    radius: f32,
    heading: Heading,
) -> Vec<(f32, f32)> {
    use std::f32::consts::TAU;

    let coherent = (coherence.clamp(0.0, 1.0) * n as f32).round() as usize;
    let dir = match heading {
        Heading::Left => -1.0,
        Heading::Right => 1.0,
    };
    let speed = 2.5;

    let mut base_rng = SmallRng::seed_from_u64(seed);
    let mut noise_rng = SmallRng::seed_from_u64(
        seed ^ (frame as u64)
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(1),
    );

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Base draw happens for every dot so the stream stays aligned
        // across frames regardless of the coherent split.
        let angle = base_rng.random_range(0.0..TAU);
        let rr = radius * base_rng.random_range(0.0f32..1.0).sqrt();
        let (bx, by) = (rr * angle.cos(), rr * angle.sin());

        let (x, y) = if i < coherent {
            (wrap(bx + dir * speed * frame as f32, radius), by)
        } else {
            let angle = noise_rng.random_range(0.0..TAU);
            let rr = radius * noise_rng.random_range(0.0f32..1.0).sqrt();
            (rr * angle.cos(), rr * angle.sin())
        };
        if x * x + y * y <= radius * radius {
            out.push((x, y));
        }
    }
    out
}

fn wrap(x: f32, radius: f32) -> f32 {
    let span = 2.0 * radius;
    let mut v = (x + radius) % span;
    if v < 0.0 {
        v += span;
    }
    v - radius
}
