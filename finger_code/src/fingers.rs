//! Finger-state extraction: one hand's landmarks → five extended/curled bits.
//!
//! Each frame is classified on its own.  There is no smoothing, so a hand
//! moving between poses may flicker through intermediate states; the
//! dispatch gate is what keeps that from turning into repeated keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::landmark::{
    HandLandmarks, Handedness,
    THUMB_IP, THUMB_TIP,
    INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP,
    RING_PIP, RING_TIP, PINKY_PIP, PINKY_TIP,
};

// ════════════════════════════════════════════════════════════════════════════
// Finger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers in finger-state order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Finger::Thumb  => "thumb",
            Finger::Index  => "index",
            Finger::Middle => "middle",
            Finger::Ring   => "ring",
            Finger::Pinky  => "pinky",
        }
    }

    fn bit(self) -> u8 {
        1 << (4 - self as u8)
    }
}

/// (tip, PIP) landmark pairs for the four non-thumb fingers.
const FINGER_JOINTS: [(Finger, usize, usize); 4] = [
    (Finger::Index,  INDEX_TIP,  INDEX_PIP),
    (Finger::Middle, MIDDLE_TIP, MIDDLE_PIP),
    (Finger::Ring,   RING_TIP,   RING_PIP),
    (Finger::Pinky,  PINKY_TIP,  PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// FingerState: the 5-bit vector
// ════════════════════════════════════════════════════════════════════════════

/// Extended (1) / curled (0) bits in the order thumb, index, middle, ring,
/// pinky.
///
/// Displayed and parsed thumb-first, so `"11000"` is thumb + index up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FingerState(u8);

impl FingerState {
    pub const ALL_DOWN: FingerState = FingerState(0b00000);
    pub const ALL_UP:   FingerState = FingerState(0b11111);

    /// Build from `[thumb, index, middle, ring, pinky]`; any non-zero entry
    /// counts as extended.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        let mut state = FingerState::ALL_DOWN;
        for (finger, b) in Finger::ALL.iter().zip(bits) {
            state = state.with(*finger, b != 0);
        }
        state
    }

    /// Parse the thumb-first text form, e.g. `"10101"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 5 { return None; }
        let mut bits = [0u8; 5];
        for (slot, c) in bits.iter_mut().zip(s.chars()) {
            *slot = match c {
                '0' => 0,
                '1' => 1,
                _   => return None,
            };
        }
        Some(FingerState::from_bits(bits))
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0 & finger.bit() != 0
    }

    pub fn with(self, finger: Finger, extended: bool) -> Self {
        if extended {
            FingerState(self.0 | finger.bit())
        } else {
            FingerState(self.0 & !finger.bit())
        }
    }

    pub fn toggled(self, finger: Finger) -> Self {
        FingerState(self.0 ^ finger.bit())
    }

    pub fn bits(&self) -> [u8; 5] {
        Finger::ALL.map(|f| self.is_extended(f) as u8)
    }

    /// Number of extended fingers.
    pub fn count(&self) -> u32 { self.0.count_ones() }

    /// Every possible state, `00000` through `11111`.
    pub fn all() -> impl Iterator<Item = FingerState> {
        (0u8..32).map(FingerState)
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.bits() {
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FingerState({})", self)
    }
}

impl FromStr for FingerState {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FingerState::parse(s).ok_or_else(|| TableError::BadFingers(s.to_string()))
    }
}

impl Serialize for FingerState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FingerState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ThumbRule
// ════════════════════════════════════════════════════════════════════════════

/// Which horizontal direction counts as "thumb extended".
///
/// The thumb folds sideways, so it is judged on x rather than y, and the
/// correct sign depends on hand and camera mirroring.  A fixed rule is only
/// right for one hand on one kind of feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThumbRule {
    /// Extended when the tip is left of the IP joint.  Right hand on a
    /// mirrored (selfie) feed.
    #[default]
    TipLeft,
    /// Extended when the tip is right of the IP joint.  Right hand on an
    /// unmirrored feed, or left hand on a mirrored one.
    TipRight,
    /// `TipLeft` for right hands, `TipRight` for left hands, `TipLeft` when
    /// the estimator gives no handedness.  Assumes a mirrored feed.
    ByHandedness,
}

impl ThumbRule {
    /// The fixed rule that applies to a hand of the given handedness.
    pub fn resolve(self, handedness: Option<Handedness>) -> ThumbRule {
        match (self, handedness) {
            (ThumbRule::ByHandedness, Some(Handedness::Left)) => ThumbRule::TipRight,
            (ThumbRule::ByHandedness, _)                      => ThumbRule::TipLeft,
            (fixed, _)                                        => fixed,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThumbRule::TipLeft      => "tip-left",
            ThumbRule::TipRight     => "tip-right",
            ThumbRule::ByHandedness => "by-handedness",
        }
    }
}

impl FromStr for ThumbRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tip-left" | "left" | "mirrored"     => Ok(ThumbRule::TipLeft),
            "tip-right" | "right" | "unmirrored" => Ok(ThumbRule::TipRight),
            "by-handedness" | "by-hand" | "auto" => Ok(ThumbRule::ByHandedness),
            other => Err(format!("unknown thumb rule {:?} (tip-left, tip-right, by-hand)", other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// extract
// ════════════════════════════════════════════════════════════════════════════

/// Classify a validated hand into its finger state.
pub fn extract(hand: &HandLandmarks, rule: ThumbRule) -> FingerState {
    let tip = hand.point(THUMB_TIP);
    let ip  = hand.point(THUMB_IP);
    let thumb_up = match rule.resolve(hand.handedness()) {
        ThumbRule::TipRight => tip.x > ip.x,
        _                   => tip.x < ip.x,
    };

    let mut state = FingerState::ALL_DOWN.with(Finger::Thumb, thumb_up);
    for (finger, tip_id, pip_id) in FINGER_JOINTS {
        // Smaller y is higher on screen.
        let up = hand.point(tip_id).y < hand.point(pip_id).y;
        state = state.with(finger, up);
    }
    state
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, LANDMARK_COUNT};
    use proptest::prelude::*;

    /// Neutral hand: every point at (0.5, 0.5), so every comparison is equal
    /// and the state is all-down.
    fn flat() -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5); LANDMARK_COUNT]
    }

    fn hand(pts: &[Landmark], h: Option<Handedness>) -> HandLandmarks {
        HandLandmarks::new(pts, h).unwrap()
    }

    // ── FingerState ──────────────────────────────────────────────────────
    #[test]
    fn parse_and_display_are_thumb_first() {
        let s = FingerState::parse("11000").unwrap();
        assert!(s.is_extended(Finger::Thumb));
        assert!(s.is_extended(Finger::Index));
        assert!(!s.is_extended(Finger::Middle));
        assert_eq!(s.to_string(), "11000");
        assert_eq!(s.bits(), [1, 1, 0, 0, 0]);
    }

    #[test]
    fn parse_rejects_junk() {
        assert_eq!(FingerState::parse("1100"), None);
        assert_eq!(FingerState::parse("110001"), None);
        assert_eq!(FingerState::parse("11x00"), None);
        assert!("abc".parse::<FingerState>().is_err());
    }

    #[test]
    fn all_covers_32_distinct_states() {
        let v: Vec<_> = FingerState::all().collect();
        assert_eq!(v.len(), 32);
        assert_eq!(v[0], FingerState::ALL_DOWN);
        assert_eq!(v[31], FingerState::ALL_UP);
    }

    #[test]
    fn toggled_flips_one_finger() {
        let s = FingerState::ALL_DOWN.toggled(Finger::Ring);
        assert_eq!(s.to_string(), "00010");
        assert_eq!(s.toggled(Finger::Ring), FingerState::ALL_DOWN);
    }

    #[test]
    fn serde_uses_text_form() {
        let s = FingerState::parse("10101").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"10101\"");
        let back: FingerState = serde_json::from_str("\"10101\"").unwrap();
        assert_eq!(back, s);
    }

    // ── extract ──────────────────────────────────────────────────────────
    #[test]
    fn flat_hand_is_all_down() {
        assert_eq!(extract(&hand(&flat(), None), ThumbRule::TipLeft), FingerState::ALL_DOWN);
    }

    #[test]
    fn thumb_uses_x_axis() {
        let mut pts = flat();
        pts[THUMB_TIP] = Landmark::new(0.40, 0.5);
        pts[THUMB_IP]  = Landmark::new(0.45, 0.5);
        let h = hand(&pts, None);
        assert_eq!(extract(&h, ThumbRule::TipLeft).to_string(),  "10000");
        assert_eq!(extract(&h, ThumbRule::TipRight).to_string(), "00000");
    }

    #[test]
    fn fingers_use_y_axis() {
        let mut pts = flat();
        pts[MIDDLE_TIP] = Landmark::new(0.5, 0.2);
        pts[MIDDLE_PIP] = Landmark::new(0.5, 0.4);
        pts[PINKY_TIP]  = Landmark::new(0.5, 0.1);
        pts[PINKY_PIP]  = Landmark::new(0.5, 0.3);
        assert_eq!(extract(&hand(&pts, None), ThumbRule::TipLeft).to_string(), "00101");
    }

    #[test]
    fn equal_coordinates_count_as_curled() {
        let mut pts = flat();
        pts[INDEX_TIP] = Landmark::new(0.1, 0.5);
        pts[INDEX_PIP] = Landmark::new(0.9, 0.5);
        assert_eq!(extract(&hand(&pts, None), ThumbRule::TipLeft), FingerState::ALL_DOWN);
    }

    #[test]
    fn by_handedness_flips_for_left_hand() {
        let mut pts = flat();
        pts[THUMB_TIP] = Landmark::new(0.60, 0.5);
        pts[THUMB_IP]  = Landmark::new(0.55, 0.5);
        let left  = hand(&pts, Some(Handedness::Left));
        let right = hand(&pts, Some(Handedness::Right));
        assert!(extract(&left,  ThumbRule::ByHandedness).is_extended(Finger::Thumb));
        assert!(!extract(&right, ThumbRule::ByHandedness).is_extended(Finger::Thumb));
        // A fixed rule ignores handedness entirely.
        assert!(!extract(&left, ThumbRule::TipLeft).is_extended(Finger::Thumb));
    }

    #[test]
    fn thumb_rule_from_str() {
        assert_eq!("tip-left".parse::<ThumbRule>(),  Ok(ThumbRule::TipLeft));
        assert_eq!("Unmirrored".parse::<ThumbRule>(), Ok(ThumbRule::TipRight));
        assert_eq!("by-hand".parse::<ThumbRule>(),   Ok(ThumbRule::ByHandedness));
        assert!("sideways".parse::<ThumbRule>().is_err());
    }

    // ── properties ───────────────────────────────────────────────────────
    fn coord() -> impl Strategy<Value = f32> { 0.0f32..=1.0 }

    fn any_hand() -> impl Strategy<Value = Vec<Landmark>> {
        proptest::collection::vec((coord(), coord()), LANDMARK_COUNT)
            .prop_map(|v| v.into_iter().map(|(x, y)| Landmark::new(x, y)).collect())
    }

    proptest! {
        #[test]
        fn all_up_when_every_tip_leads(mut pts in any_hand(), gap in 0.01f32..0.4) {
            pts[THUMB_IP]  = Landmark::new(0.5 + gap, pts[THUMB_IP].y);
            pts[THUMB_TIP] = Landmark::new(0.5, pts[THUMB_TIP].y);
            for (_, tip, pip) in FINGER_JOINTS {
                pts[pip] = Landmark::new(pts[pip].x, 0.5 + gap);
                pts[tip] = Landmark::new(pts[tip].x, 0.5);
            }
            prop_assert_eq!(extract(&hand(&pts, None), ThumbRule::TipLeft), FingerState::ALL_UP);
        }

        #[test]
        fn all_down_when_no_tip_leads(mut pts in any_hand(), gap in 0.0f32..0.4) {
            pts[THUMB_IP]  = Landmark::new(0.5, pts[THUMB_IP].y);
            pts[THUMB_TIP] = Landmark::new(0.5 + gap, pts[THUMB_TIP].y);
            for (_, tip, pip) in FINGER_JOINTS {
                pts[pip] = Landmark::new(pts[pip].x, 0.5);
                pts[tip] = Landmark::new(pts[tip].x, 0.5 + gap);
            }
            prop_assert_eq!(extract(&hand(&pts, None), ThumbRule::TipLeft), FingerState::ALL_DOWN);
        }

        #[test]
        fn extraction_is_idempotent(pts in any_hand()) {
            let h = hand(&pts, None);
            prop_assert_eq!(extract(&h, ThumbRule::TipLeft), extract(&h, ThumbRule::TipLeft));
        }

        #[test]
        fn parse_display_agree(bits in 0u8..32) {
            let s = FingerState(bits);
            prop_assert_eq!(FingerState::parse(&s.to_string()), Some(s));
        }
    }
}
