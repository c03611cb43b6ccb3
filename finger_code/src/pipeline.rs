//! One hand's full decision path: validate → extract → lookup → gate.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::LandmarkError;
use crate::fingers::{extract, FingerState, ThumbRule};
use crate::gate::{Decision, DispatchGate, Suppressed};
use crate::landmark::{DetectedHand, HandLandmarks};
use crate::table::{Action, GestureTable};

// ════════════════════════════════════════════════════════════════════════════
// Outcome
// ════════════════════════════════════════════════════════════════════════════

/// Result of processing one hand on one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Forward `action` to the sink.
    Fired      { fingers: FingerState, action: Action },
    /// Mapped gesture held back by the cooldown.
    Suppressed { fingers: FingerState, action: Action, remaining: Duration },
    /// Pose has no table entry.
    Unmapped   { fingers: FingerState },
}

impl Outcome {
    pub fn fingers(&self) -> FingerState {
        match self {
            Outcome::Fired      { fingers, .. }
            | Outcome::Suppressed { fingers, .. }
            | Outcome::Unmapped   { fingers } => *fingers,
        }
    }

    /// The action to dispatch, if this outcome fired.
    pub fn fired(&self) -> Option<&Action> {
        match self {
            Outcome::Fired { action, .. } => Some(action),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pipeline
// ════════════════════════════════════════════════════════════════════════════

/// Classifier plus the gate state for one hand.
///
/// The table is shared; the gate is not.  Use one `Pipeline` per tracked
/// hand.
#[derive(Clone, Debug)]
pub struct Pipeline {
    table: Arc<GestureTable>,
    gate:  DispatchGate,
    thumb: ThumbRule,
}

impl Pipeline {
    pub fn new(table: Arc<GestureTable>, cooldown: Duration) -> Self {
        Pipeline { table, gate: DispatchGate::new(cooldown), thumb: ThumbRule::default() }
    }

    pub fn with_thumb_rule(mut self, thumb: ThumbRule) -> Self {
        self.thumb = thumb;
        self
    }

    /// Run one hand through the pipeline at session time `now`.
    ///
    /// Invalid landmarks fail before classification and leave the gate
    /// untouched.
    pub fn process(&mut self, hand: &DetectedHand, now: Duration) -> Result<Outcome, LandmarkError> {
        let landmarks = hand.validate()?;
        Ok(self.classify(&landmarks, now))
    }

    /// Same as [`process`](Self::process) for landmarks already validated.
    pub fn classify(&mut self, landmarks: &HandLandmarks, now: Duration) -> Outcome {
        let fingers   = extract(landmarks, self.thumb);
        let action    = self.table.lookup(fingers);

        match self.gate.evaluate(&action, now) {
            Decision::Fire => {
                info!(%fingers, %action, "gesture fired");
                Outcome::Fired { fingers, action }
            }
            Decision::Suppress(Suppressed::Cooldown { remaining }) => {
                Outcome::Suppressed { fingers, action, remaining }
            }
            Decision::Suppress(Suppressed::Unmapped) => {
                debug!(%fingers, "gesture not mapped");
                Outcome::Unmapped { fingers }
            }
        }
    }

    pub fn gate(&self) -> &DispatchGate { &self.gate }
    pub fn gate_mut(&mut self) -> &mut DispatchGate { &mut self.gate }
    pub fn table(&self) -> &GestureTable { &self.table }
    pub fn thumb_rule(&self) -> ThumbRule { self.thumb }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
