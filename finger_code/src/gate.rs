//! Dispatch gate: cooldown between fired actions.
//!
//! A held pose is seen on every frame.  The gate lets the first sighting
//! through and then suppresses everything until the cooldown has passed,
//! measured from the last fire.
//!
//! ```text
//!            fire (last = now)
//!  COOLED_DOWN ───────────────▶ IN_COOLDOWN
//!       ▲                            │
//!       └──── now - last > cooldown ─┘
//! ```
//!
//! `Unmapped` never fires and never touches the timestamp.  Time is whatever
//! monotonic session time the caller passes in; see [`crate::clock`].

use std::time::Duration;

use tracing::debug;

use crate::table::Action;

/// Default minimum interval between fired actions.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

// ════════════════════════════════════════════════════════════════════════════
// Decision
// ════════════════════════════════════════════════════════════════════════════

/// Why the gate held an action back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppressed {
    /// The gesture has no table entry.
    Unmapped,
    /// Still inside the cooldown window; `remaining` until the gate reopens.
    Cooldown { remaining: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Fire,
    Suppress(Suppressed),
}

impl Decision {
    pub fn is_fire(&self) -> bool { *self == Decision::Fire }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePhase {
    CooledDown,
    InCooldown,
}

// ════════════════════════════════════════════════════════════════════════════
// DispatchGate
// ════════════════════════════════════════════════════════════════════════════

/// Rate limiter for one hand.  Not shared between threads; give each hand
/// or source its own gate.
#[derive(Clone, Debug)]
pub struct DispatchGate {
    cooldown:  Duration,
    last_fire: Option<Duration>,
}

impl DispatchGate {
    pub fn new(cooldown: Duration) -> Self {
        DispatchGate { cooldown, last_fire: None }
    }

    /// Decide whether `action` fires at `now`.  Firing records `now`.
    pub fn evaluate(&mut self, action: &Action, now: Duration) -> Decision {
        if !action.is_mapped() {
            return Decision::Suppress(Suppressed::Unmapped);
        }
        match self.last_fire {
            Some(last) if now.saturating_sub(last) <= self.cooldown => {
                let remaining = self.remaining(now);
                debug!(?action, ?remaining, "suppressed by cooldown");
                Decision::Suppress(Suppressed::Cooldown { remaining })
            }
            _ => {
                self.last_fire = Some(now);
                Decision::Fire
            }
        }
    }

    /// Phase as of `now`, without changing anything.
    pub fn phase(&self, now: Duration) -> GatePhase {
        match self.last_fire {
            Some(last) if now.saturating_sub(last) <= self.cooldown => GatePhase::InCooldown,
            _ => GatePhase::CooledDown,
        }
    }

    /// Time left in the current cooldown window (zero when cooled down).
    pub fn remaining(&self, now: Duration) -> Duration {
        match self.last_fire {
            Some(last) => self.cooldown.saturating_sub(now.saturating_sub(last)),
            None       => Duration::ZERO,
        }
    }

    /// Forget the last fire; the next mapped action fires immediately.
    pub fn reset(&mut self) { self.last_fire = None; }

    pub fn cooldown(&self) -> Duration { self.cooldown }
    pub fn last_fire(&self) -> Option<Duration> { self.last_fire }
}

impl Default for DispatchGate {
    fn default() -> Self { DispatchGate::new(DEFAULT_COOLDOWN) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
