//! Top-level application state machine.
//!
//! `AppState` owns one `Pipeline` per tracked hand, the action sink, and the
//! status shown to the user.  It processes `Frame`s from whichever landmark
//! source is running and drives the visualizer each frame.

use std::collections::HashMap;
use std::io::{self, BufReader};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use finger_code::{
    Action, Clock, FingerState, Frame, GestureTable, HandLandmarks, Handedness,
    Outcome, Pipeline, SessionClock, ThumbRule,
};

use crate::config::{AppConfig, SourceKind};
use crate::error::AppError;
use crate::sink::{open_sink, ActionSink};
use crate::source::{
    spawn_landmark_source, JsonLinesSource, SimHandSource, SimInput, SourceEvent,
};
use crate::visualizer::Visualizer;

/// Characters of typed text kept for the on-screen transcript.
const TRANSCRIPT_LEN: usize = 48;

// ════════════════════════════════════════════════════════════════════════════
// Status
// ════════════════════════════════════════════════════════════════════════════

/// What the user is told about the latest frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Status {
    NoHand,
    Pressed(Action),
    NotMapped,
    Waiting(Duration),
    Invalid(String),
}

impl Status {
    pub fn text(&self) -> String {
        match self {
            Status::NoHand       => "Show your hand to control keyboard".to_string(),
            Status::Pressed(a)   => format!("Pressed: {}", a),
            Status::NotMapped    => "Gesture not mapped".to_string(),
            Status::Waiting(d)   => format!("Waiting: {:.1}s", d.as_secs_f32()),
            Status::Invalid(why) => format!("Invalid landmarks: {}", why),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSlot: which pipeline a detection belongs to
// ════════════════════════════════════════════════════════════════════════════

/// With a single tracked hand every detection shares one slot, since
/// estimators relabel handedness between frames.  With several, hands are
/// tracked by handedness when reported, otherwise by their position among
/// the accepted hands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum HandSlot {
    Hand(Handedness),
    Index(usize),
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── classification ───────────────────────────────────────────────────
    table:      Arc<GestureTable>,
    cooldown:   Duration,
    thumb:      ThumbRule,
    max_hands:  usize,
    min_score:  f32,
    pipelines:  HashMap<HandSlot, Pipeline>,

    // ── output ───────────────────────────────────────────────────────────
    sink:       Box<dyn ActionSink>,
    transcript: String,

    // ── display ──────────────────────────────────────────────────────────
    pub status:   Status,
    last_fingers: Option<FingerState>,
    last_hands:   Vec<HandLandmarks>,
    cooldown_left: Duration,

    /// Set once a left hand has been seen under a fixed thumb rule.
    warned_left_hand: bool,
}

impl AppState {
    pub fn new(cfg: &AppConfig, sink: Box<dyn ActionSink>) -> Result<Self, AppError> {
        cfg.validate()?;
        let table = Arc::new(cfg.build_table()?);
        info!(entries = table.len(), cooldown = cfg.cooldown_secs, thumb = cfg.thumb.name(), "gesture table loaded");

        Ok(AppState {
            table,
            cooldown:   cfg.cooldown()?,
            thumb:      cfg.thumb,
            max_hands:  cfg.max_hands,
            min_score:  cfg.min_score,
            pipelines:  HashMap::new(),
            sink,
            transcript: String::new(),
            status:        Status::NoHand,
            last_fingers:  None,
            last_hands:    Vec::new(),
            cooldown_left: Duration::ZERO,
            warned_left_hand: false,
        })
    }

    // ── process one Frame ────────────────────────────────────────────────

    /// Classify every usable hand in `frame` at session time `now` and send
    /// fired actions to the sink.  Returns one outcome per classified hand.
    pub fn handle_frame(&mut self, frame: &Frame, now: Duration) -> Vec<Outcome> {
        let hands: Vec<_> = frame.hands.iter()
            .filter(|h| h.score.map_or(true, |s| s >= self.min_score))
            .take(self.max_hands)
            .enumerate()
            .collect();

        self.last_hands.clear();
        if hands.is_empty() {
            self.status = Status::NoHand;
            self.cooldown_left = Duration::ZERO;
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(hands.len());
        for (index, hand) in hands {
            if hand.handedness == Some(Handedness::Left)
                && self.thumb != ThumbRule::ByHandedness
                && !self.warned_left_hand
            {
                warn!("left hand detected; thumb rule {} assumes a right hand (try --thumb by-hand)", self.thumb.name());
                self.warned_left_hand = true;
            }

            let landmarks = match hand.validate() {
                Ok(lm) => lm,
                Err(e) => {
                    warn!("skipping hand {}: {}", index, e);
                    self.status = Status::Invalid(e.to_string());
                    continue;
                }
            };

            let slot = match hand.handedness {
                _ if self.max_hands == 1 => HandSlot::Index(0),
                Some(h)                  => HandSlot::Hand(h),
                None                     => HandSlot::Index(index),
            };
            let (table, cooldown, thumb) = (&self.table, self.cooldown, self.thumb);
            let pipeline = self.pipelines.entry(slot).or_insert_with(|| {
                Pipeline::new(Arc::clone(table), cooldown).with_thumb_rule(thumb)
            });

            let outcome = pipeline.classify(&landmarks, now);
            self.cooldown_left = pipeline.gate().remaining(now);
            self.last_hands.push(landmarks);
            self.apply(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    fn apply(&mut self, outcome: &Outcome) {
        self.last_fingers = Some(outcome.fingers());
        self.status = match *outcome {
            Outcome::Fired { action, .. } => {
                if let Err(e) = self.sink.emit(&action) {
                    warn!("{} sink: {}", self.sink.name(), e);
                }
                self.record(action);
                Status::Pressed(action)
            }
            Outcome::Suppressed { remaining, .. } => match &self.status {
                // Keep showing the key that started the cooldown.
                Status::Pressed(a) => Status::Pressed(*a),
                _                  => Status::Waiting(remaining),
            },
            Outcome::Unmapped { .. } => Status::NotMapped,
        };
    }

    fn record(&mut self, action: Action) {
        match action {
            Action::Char(c)   => self.transcript.push(c),
            Action::Backspace => { self.transcript.pop(); }
            Action::Enter     => self.transcript.clear(),
            Action::Unmapped  => {}
        }
        let extra = self.transcript.chars().count().saturating_sub(TRANSCRIPT_LEN);
        if extra > 0 {
            self.transcript = self.transcript.chars().skip(extra).collect();
        }
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn table(&self)         -> &GestureTable          { &self.table }
    pub fn last_fingers(&self)  -> Option<FingerState>    { self.last_fingers }
    pub fn last_hands(&self)    -> &[HandLandmarks]       { &self.last_hands }
    pub fn transcript(&self)    -> &str                   { &self.transcript }
    pub fn sink_name(&self)     -> &'static str           { self.sink.name() }

    /// Fraction of the cooldown still to run, 0.0–1.0.
    pub fn cooldown_fraction(&self) -> f32 {
        if self.cooldown.is_zero() { return 0.0; }
        (self.cooldown_left.as_secs_f32() / self.cooldown.as_secs_f32()).clamp(0.0, 1.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameTimer: one time domain per session
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimeDomain {
    /// Estimator timestamps.
    Capture,
    /// Local session clock.
    Local,
}

/// Session time for each incoming frame.
///
/// The first frame fixes the domain: its capture timestamp if it has one,
/// otherwise the local clock.  Later frames without a timestamp in a
/// capture-timed session reuse the last capture time; timestamps in a
/// locally-timed session are ignored.
pub struct FrameTimer<C: Clock> {
    clock:  C,
    domain: Option<TimeDomain>,
    last:   Duration,
}

impl<C: Clock> FrameTimer<C> {
    pub fn new(clock: C) -> Self {
        FrameTimer { clock, domain: None, last: Duration::ZERO }
    }

    pub fn now(&mut self, frame: &Frame) -> Duration {
        let capture = frame.capture_time();
        let domain = *self.domain.get_or_insert_with(|| {
            let d = if capture.is_some() { TimeDomain::Capture } else { TimeDomain::Local };
            info!(?d, "frame time domain");
            d
        });
        self.last = match (domain, capture) {
            (TimeDomain::Capture, Some(t)) => t,
            (TimeDomain::Capture, None)    => {
                debug!("frame without timestamp; reusing {:?}", self.last);
                self.last
            }
            (TimeDomain::Local, _)         => self.clock.now(),
        };
        self.last
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It opens the landmark
/// source and, unless headless, the visualizer, then feeds frames through
/// the app until the source ends or the window closes.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let sink  = open_sink(cfg.inject);
    let mut app = AppState::new(&cfg, sink)?;
    let mut timer = FrameTimer::new(SessionClock::start());

    // ── Sim input channel (unused by other sources) ──────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    let frames = match cfg.source {
        SourceKind::Sim   => spawn_landmark_source(SimHandSource::new(sim_rx)),
        SourceKind::Stdin => spawn_landmark_source(JsonLinesSource::new(BufReader::new(io::stdin()))),
        SourceKind::Leap  => open_leap()?,
    };
    info!(source = ?cfg.source, sink = app.sink_name(), "running");

    if cfg.headless {
        return run_headless(&mut app, &frames, &mut timer);
    }

    let mut vis = Visualizer::new(sim_tx, cfg.source == SourceKind::Sim)?;

    while vis.is_open() {
        // 1. Poll window input → SimInput
        if !vis.poll_input() { break; }

        // 2. Drain landmark frames
        loop {
            match frames.try_recv() {
                Ok(SourceEvent::Frame(frame)) => {
                    let now = timer.now(&frame);
                    app.handle_frame(&frame, now);
                }
                Ok(SourceEvent::Error(e))       => warn!("[source] {}", e),
                Ok(SourceEvent::Quit)           => return Ok(()),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        // 3. Render
        vis.render(&app);
    }

    Ok(())
}

/// Blocking loop without a window: one frame in, at most one key out.
fn run_headless<C: Clock>(
    app:    &mut AppState,
    frames: &Receiver<SourceEvent>,
    timer:  &mut FrameTimer<C>,
) -> Result<(), AppError> {
    for event in frames.iter() {
        match event {
            SourceEvent::Frame(frame) => {
                let now = timer.now(&frame);
                app.handle_frame(&frame, now);
            }
            SourceEvent::Error(e) => warn!("[source] {}", e),
            SourceEvent::Quit     => break,
        }
    }
    Ok(())
}

#[cfg(feature = "leap")]
fn open_leap() -> Result<Receiver<SourceEvent>, AppError> {
    Ok(spawn_landmark_source(crate::source::LeapLandmarkSource))
}

#[cfg(not(feature = "leap"))]
fn open_leap() -> Result<Receiver<SourceEvent>, AppError> {
    Err(AppError::Source("built without LeapMotion support (use --features leap)".into()))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
