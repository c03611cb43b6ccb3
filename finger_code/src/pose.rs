//! Synthetic hand poses.
//!
//! Builds a plausible 21-point hand, palm toward a mirrored camera, with the
//! requested fingers extended.  The keyboard simulator draws and classifies
//! these, and tests use them as fixtures.

use crate::fingers::{Finger, FingerState};
use crate::landmark::{HandLandmarks, Handedness, Landmark, LANDMARK_COUNT};

const WRIST: (f32, f32) = (0.50, 0.85);

/// (MCP x, MCP y, finger length) for index, middle, ring, pinky of a right
/// hand.  Left hands are mirrored about x = 0.5.
const FINGERS: [(f32, f32, f32); 4] = [
    (0.44, 0.60, 0.20),
    (0.50, 0.58, 0.22),
    (0.56, 0.60, 0.20),
    (0.62, 0.63, 0.16),
];

const THUMB_CMC: (f32, f32) = (0.43, 0.80);
const THUMB_MCP: (f32, f32) = (0.38, 0.74);
const THUMB_IP:  (f32, f32) = (0.34, 0.69);
const THUMB_TIP_OUT:  (f32, f32) = (0.29, 0.64);
const THUMB_TIP_FOLD: (f32, f32) = (0.41, 0.67);

/// Landmarks whose extracted state equals `state` under
/// [`ThumbRule::ByHandedness`](crate::fingers::ThumbRule::ByHandedness)
/// (and under the default rule for right or unknown hands).
pub fn synthesize(state: FingerState, handedness: Option<Handedness>) -> HandLandmarks {
    let mirror = handedness == Some(Handedness::Left);
    let at = |(x, y): (f32, f32)| {
        Landmark::new(if mirror { 1.0 - x } else { x }, y)
    };

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[0] = at(WRIST);
    pts[1] = at(THUMB_CMC);
    pts[2] = at(THUMB_MCP);
    pts[3] = at(THUMB_IP);
    pts[4] = if state.is_extended(Finger::Thumb) { at(THUMB_TIP_OUT) } else { at(THUMB_TIP_FOLD) };

    let others = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];
    for (n, (finger, (x, y, len))) in others.iter().zip(FINGERS).enumerate() {
        let base = 5 + n * 4;
        // MCP, PIP, DIP, TIP offsets along y, as fractions of finger length.
        let rise: [f32; 4] = if state.is_extended(*finger) {
            [0.0, 0.40, 0.70, 1.00]
        } else {
            [0.0, 0.35, 0.15, -0.05]
        };
        for (j, r) in rise.iter().enumerate() {
            pts[base + j] = at((x, y - len * r));
        }
    }

    HandLandmarks::from_array(pts, handedness)
}
