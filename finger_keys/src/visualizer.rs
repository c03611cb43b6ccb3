//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────┬────────────────┐
//! │                                  │  GESTURES      │
//! │   hand skeleton                  │  10000  A      │
//! │   (fingers colored up / down)    │  01000  B      │
//! │                                  │  ...           │
//! │                                  │                │
//! ├──────────────────────────────────┴────────────────┤
//! │  Fingers: (1, 1, 0, 0, 0)    [cooldown bar]       │
//! │  status text                         typed text   │
//! │  key legend                                       │
//! └───────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use finger_code::landmark::BONES;
use finger_code::{Finger, FingerState, HandLandmarks, Landmark};

use crate::app::{AppState, Status};
use crate::error::AppError;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 900;
pub const WIN_H:      usize = 560;
const LEGEND_W:       usize = 260;
const HAND_W:         usize = WIN_W - LEGEND_W;
const HAND_H:         usize = 420;
const STATUS_Y:       usize = HAND_H;
const BAR_W:          usize = 200;
const BG_COLOR:       u32   = 0xFF1A1A2E;
const LEGEND_BG:      u32   = 0xFF16213E;
const TEXT_BG:        u32   = 0xFF0F3460;
const BONE_COLOR:     u32   = 0xFF8899AA;
const UP_COLOR:       u32   = 0xFF4CD964;  // extended finger
const DOWN_COLOR:     u32   = 0xFFE05050;  // curled finger
const JOINT_COLOR:    u32   = 0xFFEEEEEE;
const HILITE_COLOR:   u32   = 0xFFFFD700;

/// Landmark indices belonging to each finger, thumb first.
const FINGER_POINTS: [[usize; 4]; 5] = [
    [1, 2, 3, 4],
    [5, 6, 7, 8],
    [9, 10, 11, 12],
    [13, 14, 15, 16],
    [17, 18, 19, 20],
];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
    /// Finger keys only drive the simulated hand.
    sim:    bool,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, sim: bool) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Finger Keys",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            sim,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard input and translate it into `SimInput` events.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Q) || pressed(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return false;
        }
        if !self.sim { return true; }

        let mut events = Vec::new();
        for (key, finger) in [
            (Key::Key1, Finger::Thumb),
            (Key::Key2, Finger::Index),
            (Key::Key3, Finger::Middle),
            (Key::Key4, Finger::Ring),
            (Key::Key5, Finger::Pinky),
        ] {
            if pressed(key) { events.push(SimInput::Toggle(finger)); }
        }
        if pressed(Key::Key0) { events.push(SimInput::Set(FingerState::ALL_DOWN)); }
        if pressed(Key::Key9) { events.push(SimInput::Set(FingerState::ALL_UP)); }
        if pressed(Key::H)    { events.push(SimInput::ToggleHand); }

        for ev in events {
            let _ = self.sim_tx.send(ev);
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) {
        self.buf.fill(BG_COLOR);

        // ── Hand panel ────────────────────────────────────────────────────
        let fingers = app.last_fingers();
        for hand in app.last_hands() {
            self.draw_hand(hand, fingers);
        }
        if app.last_hands().is_empty() {
            self.draw_text("no hand", HAND_W / 2 - 28, HAND_H / 2, 0xFF666666, 2);
        }

        // ── Gesture legend ────────────────────────────────────────────────
        self.draw_legend(app);

        // ── Status area ───────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);

        let readout = match fingers {
            Some(f) => format!("Fingers: ({})", f.bits().map(|b| b.to_string()).join(", ")),
            None    => "Fingers: -".to_string(),
        };
        self.draw_text(&readout, 12, STATUS_Y + 12, 0xFFEEEEEE, 2);

        let bar_x = WIN_W - BAR_W - 16;
        self.fill_rect(bar_x, STATUS_Y + 12, BAR_W, 10, 0xFF222244);
        let left = (BAR_W as f32 * app.cooldown_fraction()) as usize;
        self.fill_rect(bar_x, STATUS_Y + 12, left, 10, HILITE_COLOR);
        self.draw_border(bar_x, STATUS_Y + 12, BAR_W, 10, 0xFF000000);

        self.draw_text(&app.status.text(), 12, STATUS_Y + 44, status_color(&app.status), 3);

        let typed = format!("{}_", app.transcript());
        self.draw_text(&typed, 12, STATUS_Y + 82, 0xFFAADDFF, 2);

        // ── Key legend ────────────────────────────────────────────────────
        let legend = if self.sim {
            "1-5=toggle thumb..pinky  0=fist  9=open  H=show/hide hand  Q/Esc=quit"
        } else {
            "Q/Esc=quit"
        };
        self.draw_text(legend, 12, WIN_H - 16, 0xFF888888, 1);
        self.draw_text(app.sink_name(), WIN_W - 60, WIN_H - 16, 0xFF888888, 1);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Hand skeleton ─────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandLandmarks, fingers: Option<FingerState>) {
        let pts: Vec<(isize, isize)> = hand.points().iter().map(|p| to_panel(*p)).collect();

        for &(a, b) in BONES.iter() {
            self.draw_line(pts[a], pts[b], BONE_COLOR);
        }

        // Recolor each finger by its state.
        if let Some(state) = fingers {
            for (finger, idx) in Finger::ALL.iter().zip(FINGER_POINTS.iter()) {
                let color = if state.is_extended(*finger) { UP_COLOR } else { DOWN_COLOR };
                for w in idx.windows(2) {
                    self.draw_line(pts[w[0]], pts[w[1]], color);
                }
            }
        }

        for &(x, y) in &pts {
            self.fill_square(x, y, 3, JOINT_COLOR);
        }
    }

    // ── Gesture legend ────────────────────────────────────────────────────

    fn draw_legend(&mut self, app: &AppState) {
        self.fill_rect(HAND_W, 0, LEGEND_W, HAND_H, LEGEND_BG);
        self.draw_text("GESTURES", HAND_W + 12, 10, HILITE_COLOR, 2);

        let current = app.last_fingers();
        let rows = (HAND_H - 36) / 12;
        for (i, (fingers, action)) in app.table().entries().enumerate() {
            let col = i / rows;
            let row = i % rows;
            let x = HAND_W + 12 + col * 124;
            let y = 36 + row * 12;
            if x + 120 > WIN_W { break; }

            let color = if Some(fingers) == current { HILITE_COLOR } else { 0xFFCCCCCC };
            self.draw_text(&format!("{}  {}", fingers, action), x, y, color, 1);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(WIN_W) {
            self.set_pixel(col as isize, y as isize, color);
            self.set_pixel(col as isize, (y + h - 1) as isize, color);
        }
        for row in y..(y + h).min(WIN_H) {
            self.set_pixel(x as isize, row as isize, color);
            self.set_pixel((x + w - 1) as isize, row as isize, color);
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < WIN_W && (y as usize) < WIN_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn fill_square(&mut self, cx: isize, cy: isize, r: isize, color: u32) {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Bresenham, two pixels thick.
    fn draw_line(&mut self, from: (isize, isize), to: (isize, isize), color: u32) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            self.set_pixel(x + 1, y, color);
            self.set_pixel(x, y + 1, color);
            if x == to.0 && y == to.1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Minimal bitmap font: 3×5 glyphs, scaled up by `scale`.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32, scale: usize) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Normalized image coordinates → hand-panel pixels, keeping the aspect.
fn to_panel(p: Landmark) -> (isize, isize) {
    let side = HAND_H - 20;
    let x0 = (HAND_W - side) / 2;
    (
        x0 as isize + (p.x.clamp(0.0, 1.0) * side as f32) as isize,
        10 + (p.y.clamp(0.0, 1.0) * side as f32) as isize,
    )
}

fn status_color(status: &Status) -> u32 {
    match status {
        Status::Pressed(_) => UP_COLOR,
        Status::Waiting(_) => HILITE_COLOR,
        Status::NotMapped  => 0xFFFF9F40,
        Status::Invalid(_) => DOWN_COLOR,
        Status::NoHand     => 0xFFAAAAAA,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_mapping_stays_inside_hand_panel() {
        for p in [Landmark::new(0.0, 0.0), Landmark::new(1.0, 1.0), Landmark::new(-3.0, 7.0)] {
            let (x, y) = to_panel(p);
            assert!(x >= 0 && (x as usize) < HAND_W);
            assert!(y >= 0 && (y as usize) < HAND_H);
        }
    }

    #[test]
    fn finger_points_end_at_tips() {
        use finger_code::landmark::{INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP};
        let tips: Vec<usize> = FINGER_POINTS.iter().map(|f| f[3]).collect();
        assert_eq!(tips, vec![THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP]);
    }

    #[test]
    fn every_status_letter_has_a_glyph() {
        let fallback = char_glyph('~');
        for c in "Show your hand to control keyboard Gesture not mapped Pressed Waiting".chars() {
            if c != ' ' {
                assert_ne!(char_glyph(c), fallback, "missing glyph for {:?}", c);
            }
        }
    }
}
