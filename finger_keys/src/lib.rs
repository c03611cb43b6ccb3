//! # finger_keys
//!
//! Finger-chord virtual keyboard.  Hand landmarks come from a pose estimator
//! on stdin, a LeapMotion controller, or a keyboard-driven simulated hand;
//! `finger_code` turns each pose into a key, and the dispatch cooldown keeps
//! a held pose from repeating.
//!
//! ## Landmark sources
//!
//! | Flag | Source |
//! |---|---|
//! | (none) | Simulated hand, driven from the visualizer window |
//! | `--stdin` | JSON lines: `{"timestamp": 1.5, "hands": [{"handedness": "Right", "landmarks": [{"x":..,"y":..}, ...]}]}` |
//! | `--leap` | LeapMotion via LeapC (needs the `leap` feature) |
//!
//! ## Feature flags
//!
//! * (default): keys are printed as `Pressed: F`.
//! * `inject`: keys are typed into the focused window via `enigo`.
//! * `leap`: real LeapMotion hardware.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1`–`5` | Toggle thumb, index, middle, ring, pinky |
//! | `0` | Fist (all down) |
//! | `9` | Open hand (all up) |
//! | `H` | Show / hide the hand |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod visualizer;
