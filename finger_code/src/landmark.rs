//! Hand landmarks as delivered by an external pose estimator.
//!
//! Indices follow the 21-point MediaPipe hand topology.  Coordinates are
//! normalized to the image: `x` grows to the right, `y` grows downward, both
//! in `[0.0, 1.0]`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;

/// Number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Bone list for drawing a skeleton: pairs of landmark indices.
pub const BONES: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One normalized 2D keypoint.  Depth (`z`) from the estimator is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self { Landmark { x, y } }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Which hand the estimator believes it is looking at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    #[serde(alias = "left", alias = "LEFT")]
    Left,
    #[serde(alias = "right", alias = "RIGHT")]
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left  => "left",
            Handedness::Right => "right",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks: validated 21-point set
// ════════════════════════════════════════════════════════════════════════════

/// A complete, validated landmark set for one hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points:     [Landmark; LANDMARK_COUNT],
    handedness: Option<Handedness>,
}

impl HandLandmarks {
    /// Validate a raw point list.
    ///
    /// Fails if there are not exactly 21 points, or any coordinate is NaN,
    /// infinite, or outside `[0.0, 1.0]`.
    pub fn new(points: &[Landmark], handedness: Option<Handedness>) -> Result<Self, LandmarkError> {
        if points.len() != LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                actual:   points.len(),
            });
        }
        for (index, p) in points.iter().enumerate() {
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(LandmarkError::NonFinite { index });
            }
            if !(0.0..=1.0).contains(&p.x) || !(0.0..=1.0).contains(&p.y) {
                return Err(LandmarkError::OutOfRange { index, x: p.x, y: p.y });
            }
        }
        let mut arr = [Landmark::default(); LANDMARK_COUNT];
        arr.copy_from_slice(points);
        Ok(HandLandmarks { points: arr, handedness })
    }

    /// Trusted constructor for points already known to be in range.
    pub(crate) fn from_array(points: [Landmark; LANDMARK_COUNT], handedness: Option<Handedness>) -> Self {
        HandLandmarks { points, handedness }
    }

    pub fn point(&self, index: usize) -> Landmark { self.points[index] }
    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] { &self.points }
    pub fn handedness(&self) -> Option<Handedness> { self.handedness }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectedHand / Frame: raw estimator output
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the estimator, before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedHand {
    #[serde(default)]
    pub handedness: Option<Handedness>,
    /// Detection confidence, 0.0–1.0, if the estimator provides one.
    #[serde(default)]
    pub score:      Option<f32>,
    #[serde(default)]
    pub landmarks:  Vec<Landmark>,
}

impl DetectedHand {
    pub fn validate(&self) -> Result<HandLandmarks, LandmarkError> {
        HandLandmarks::new(&self.landmarks, self.handedness)
    }
}

impl From<HandLandmarks> for DetectedHand {
    fn from(hand: HandLandmarks) -> Self {
        DetectedHand {
            handedness: hand.handedness,
            score:      None,
            landmarks:  hand.points.to_vec(),
        }
    }
}

/// All hands detected in one camera frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture time in seconds since the start of the session, if known.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub hands:     Vec<DetectedHand>,
}

impl Frame {
    pub fn new(hands: Vec<DetectedHand>) -> Self {
        Frame { timestamp: None, hands }
    }

    /// The frame's own timestamp, when present and representable.
    pub fn capture_time(&self) -> Option<Duration> {
        self.timestamp.and_then(|t| Duration::try_from_secs_f64(t).ok())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Landmark> {
        (0..LANDMARK_COUNT)
            .map(|i| Landmark::new(i as f32 / 40.0, 1.0 - i as f32 / 40.0))
            .collect()
    }

    #[test]
    fn accepts_complete_set() {
        let pts = grid();
        let hand = HandLandmarks::new(&pts, Some(Handedness::Right)).unwrap();
        assert_eq!(hand.point(THUMB_TIP), pts[4]);
        assert_eq!(hand.handedness(), Some(Handedness::Right));
    }

    #[test]
    fn rejects_wrong_count() {
        let mut pts = grid();
        pts.pop();
        assert_eq!(
            HandLandmarks::new(&pts, None),
            Err(LandmarkError::WrongCount { expected: 21, actual: 20 })
        );
    }

    #[test]
    fn rejects_out_of_range() {
        let mut pts = grid();
        pts[7] = Landmark::new(1.2, 0.5);
        assert!(matches!(
            HandLandmarks::new(&pts, None),
            Err(LandmarkError::OutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let mut pts = grid();
        pts[3].y = f32::NAN;
        assert_eq!(HandLandmarks::new(&pts, None), Err(LandmarkError::NonFinite { index: 3 }));
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut pts = grid();
        pts[0] = Landmark::new(0.0, 1.0);
        pts[1] = Landmark::new(1.0, 0.0);
        assert!(HandLandmarks::new(&pts, None).is_ok());
    }

    #[test]
    fn frame_parses_estimator_json() {
        let json = r#"{
            "timestamp": 2.5,
            "hands": [{ "handedness": "Right", "score": 0.93,
                        "landmarks": [{ "x": 0.5, "y": 0.5, "z": -0.02 }] }]
        }"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.capture_time(), Some(Duration::from_millis(2500)));
        assert_eq!(frame.hands[0].handedness, Some(Handedness::Right));
        assert_eq!(frame.hands[0].landmarks, vec![Landmark::new(0.5, 0.5)]);
    }

    #[test]
    fn negative_timestamp_is_ignored() {
        let frame = Frame { timestamp: Some(-1.0), hands: vec![] };
        assert_eq!(frame.capture_time(), None);
    }
}
