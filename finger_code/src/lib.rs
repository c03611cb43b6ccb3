//! # finger_code
//!
//! Turns one hand's 21 pose-estimator landmarks into a keypress decision.
//!
//! ```text
//! landmarks ─▶ extract ─▶ FingerState ─▶ GestureTable::lookup ─▶ Action
//!                                                                   │
//!                                      now ─▶ DispatchGate::evaluate ◀┘
//!                                                    │
//!                                         Fire / Suppress(reason)
//! ```
//!
//! ## Finger state
//!
//! Five bits in fixed order **thumb, index, middle, ring, pinky**; `1` means
//! extended.  Written thumb-first, e.g. `11000` is thumb + index.
//!
//! | Finger | Tip | Joint | Extended when |
//! |---|---|---|---|
//! | Thumb  | 4  | 3 (IP)   | `tip.x < joint.x` (mirrored feed, see [`ThumbRule`]) |
//! | Index  | 8  | 6 (PIP)  | `tip.y < joint.y` |
//! | Middle | 12 | 10 (PIP) | `tip.y < joint.y` |
//! | Ring   | 16 | 14 (PIP) | `tip.y < joint.y` |
//! | Pinky  | 20 | 18 (PIP) | `tip.y < joint.y` |
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use finger_code::{DetectedHand, FingerState, GestureTable, Pipeline, Action};
//! use finger_code::pose::synthesize;
//!
//! let mut pipeline = Pipeline::new(Arc::new(GestureTable::default()), Duration::from_secs(1));
//! let hand = DetectedHand::from(synthesize(FingerState::parse("11000").unwrap(), None));
//!
//! let outcome = pipeline.process(&hand, Duration::ZERO).unwrap();
//! assert_eq!(outcome.fired(), Some(&Action::Char('f')));
//! ```

pub mod clock;
pub mod error;
pub mod fingers;
pub mod gate;
pub mod landmark;
pub mod pipeline;
pub mod pose;
pub mod table;

pub use clock::{Clock, ManualClock, SessionClock};
pub use error::{LandmarkError, TableError};
pub use fingers::{extract, Finger, FingerState, ThumbRule};
pub use gate::{Decision, DispatchGate, GatePhase, Suppressed, DEFAULT_COOLDOWN};
pub use landmark::{DetectedHand, Frame, HandLandmarks, Handedness, Landmark, LANDMARK_COUNT};
pub use pipeline::{Outcome, Pipeline};
pub use table::{Action, GestureTable, TableConfig, TableEntry};
