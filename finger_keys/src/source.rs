//! Landmark sources: external estimator, LeapMotion hardware, or keyboard
//! simulation.
//!
//! Every source runs on its own thread and delivers [`SourceEvent`]s over an
//! `mpsc` channel.  The app doesn't need to know where frames came from.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use finger_code::pose::synthesize;
use finger_code::{DetectedHand, Finger, FingerState, Frame, Handedness};

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// One frame's detections (possibly no hands).
    Frame(Frame),
    /// The source reported or hit a problem; more frames may follow.
    Error(String),
    /// The source is finished.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a source on its own thread and return the receiving end.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource: external pose estimator
// ════════════════════════════════════════════════════════════════════════════

/// Reads one JSON detection result per line, e.g. from a MediaPipe script
/// piped into stdin:
///
/// ```json
/// {"timestamp": 0.033, "hands": [{"handedness": "Right", "score": 0.97,
///   "landmarks": [{"x": 0.51, "y": 0.83, "z": 0.0}, ...]}]}
/// ```
///
/// `timestamp` is optional (seconds since start).  A line with an `error`
/// field is reported as [`SourceEvent::Error`].
pub struct JsonLinesSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self { JsonLinesSource { reader } }
}

#[derive(Deserialize)]
struct DetectionLine {
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    hands:     Vec<DetectedHand>,
    #[serde(default)]
    error:     Option<String>,
}

/// Decode one input line.  Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<SourceEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let event = match serde_json::from_str::<DetectionLine>(line) {
        Ok(DetectionLine { error: Some(e), .. }) => SourceEvent::Error(format!("estimator: {}", e)),
        Ok(d) => SourceEvent::Frame(Frame { timestamp: d.timestamp, hands: d.hands }),
        Err(e) => SourceEvent::Error(format!("bad detection line: {}", e)),
    };
    Some(event)
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        for line in self.reader.lines() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    warn!("[source] read error: {}", e);
                    let _ = tx.send(SourceEvent::Error(e.to_string()));
                    break;
                }
            };
            if let Some(event) = parse_line(&line) {
                if tx.send(event).is_err() { return; }
            }
        }
        debug!("[source] end of input");
        let _ = tx.send(SourceEvent::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    /// Flip one finger between extended and curled.
    Toggle(Finger),
    /// Jump straight to a pose.
    Set(FingerState),
    /// Show or hide the simulated hand.
    ToggleHand,
    Quit,
}

/// Simulated hand driven by [`SimInput`] events from the visualizer window.
///
/// Emits a synthesized frame after every input and otherwise every
/// `interval`, like a camera that keeps seeing a held pose.
pub struct SimHandSource {
    pub rx:         Receiver<SimInput>,
    pub handedness: Option<Handedness>,
    pub interval:   Duration,
}

impl SimHandSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource {
            rx,
            handedness: Some(Handedness::Right),
            interval:   Duration::from_millis(33),
        }
    }
}

/// The simulator's pose and visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimHand {
    pub fingers: FingerState,
    pub visible: bool,
}

impl Default for SimHand {
    fn default() -> Self {
        // Relaxed fist: nothing typed until the user raises a finger.
        SimHand { fingers: FingerState::ALL_DOWN, visible: false }
    }
}

impl SimHand {
    /// Apply one input.  Returns `false` on quit.
    pub fn apply(&mut self, input: SimInput) -> bool {
        match input {
            SimInput::Toggle(f) => {
                self.fingers = self.fingers.toggled(f);
                self.visible = true;
            }
            SimInput::Set(s) => {
                self.fingers = s;
                self.visible = true;
            }
            SimInput::ToggleHand => self.visible = !self.visible,
            SimInput::Quit       => return false,
        }
        true
    }

    pub fn frame(&self, handedness: Option<Handedness>) -> Frame {
        let hands = if self.visible {
            let mut hand = DetectedHand::from(synthesize(self.fingers, handedness));
            hand.score = Some(1.0);
            vec![hand]
        } else {
            Vec::new()
        };
        Frame::new(hands)
    }
}

impl LandmarkSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let mut hand = SimHand::default();
        loop {
            match self.rx.recv_timeout(self.interval) {
                Ok(input) => {
                    if !hand.apply(input) {
                        let _ = tx.send(SourceEvent::Quit);
                        return;
                    }
                    debug!("[sim] {:?} → {} visible={}", input, hand.fingers, hand.visible);
                }
                Err(RecvTimeoutError::Timeout)      => {}
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = tx.send(SourceEvent::Quit);
                    return;
                }
            }
            if tx.send(SourceEvent::Frame(hand.frame(self.handedness))).is_err() { return; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmark source backed by a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Leap joints are millimetres above the device; they are projected onto a
/// virtual selfie-camera image so the same extraction rules apply:
///
/// * x → horizontal, ±[`LEAP_HALF_WIDTH_MM`] across the image (the user's
///   right is image right, as in a mirror)
/// * y → height above device, [`LEAP_MIN_Y_MM`] at the bottom edge
///
/// Hold the hand upright, palm toward the screen.  The wrist landmark is
/// approximated by the palm centre.
#[cfg(feature = "leap")]
pub struct LeapLandmarkSource;

#[cfg(feature = "leap")]
pub const LEAP_HALF_WIDTH_MM: f32 = 200.0;
#[cfg(feature = "leap")]
pub const LEAP_MIN_Y_MM:      f32 = 80.0;
#[cfg(feature = "leap")]
pub const LEAP_SPAN_Y_MM:     f32 = 320.0;

#[cfg(feature = "leap")]
fn project(x: f32, y: f32) -> finger_code::Landmark {
    let nx = 0.5 + x / (2.0 * LEAP_HALF_WIDTH_MM);
    let ny = 1.0 - (y - LEAP_MIN_Y_MM) / LEAP_SPAN_Y_MM;
    finger_code::Landmark::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}

#[cfg(feature = "leap")]
impl LandmarkSource for LeapLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                let _ = tx.send(SourceEvent::Error(format!("LeapC connection: {:?}", e)));
                let _ = tx.send(SourceEvent::Quit);
                return;
            }
        };
        if let Err(e) = connection.open() {
            let _ = tx.send(SourceEvent::Error(format!("LeapMotion device: {:?}", e)));
            let _ = tx.send(SourceEvent::Quit);
            return;
        }

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(e) => {
                    debug!("[leap] poll: {:?}", e);
                    continue;
                }
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands = frame.hands().map(|hand| {
                    let handedness = match hand.hand_type() {
                        HandType::Left  => Handedness::Left,
                        HandType::Right => Handedness::Right,
                    };
                    let palm = hand.palm().position();
                    let mut landmarks = vec![project(palm.x, palm.y)];
                    for digit in hand.digits() {
                        // Leap thumbs have a zero-length metacarpal, so the
                        // four joints line up with CMC/MCP/IP/TIP either way.
                        let joints = [
                            digit.proximal().prev_joint(),
                            digit.intermediate().prev_joint(),
                            digit.distal().prev_joint(),
                            digit.distal().next_joint(),
                        ];
                        for j in joints {
                            landmarks.push(project(j.x, j.y));
                        }
                    }
                    DetectedHand { handedness: Some(handedness), score: Some(1.0), landmarks }
                }).collect();

                if tx.send(SourceEvent::Frame(Frame::new(hands))).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json(state: &str) -> String {
        let hand = DetectedHand::from(synthesize(FingerState::parse(state).unwrap(), None));
        serde_json::to_string(&hand).unwrap()
    }

    #[test]
    fn parse_line_frame() {
        let line = format!(r#"{{"timestamp": 1.5, "hands": [{}]}}"#, hand_json("11000"));
        match parse_line(&line) {
            Some(SourceEvent::Frame(f)) => {
                assert_eq!(f.capture_time(), Some(Duration::from_millis(1500)));
                assert_eq!(f.hands.len(), 1);
                assert_eq!(f.hands[0].landmarks.len(), 21);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_line_empty_hands() {
        assert_eq!(parse_line(r#"{"hands": []}"#), Some(SourceEvent::Frame(Frame::default())));
    }

    #[test]
    fn parse_line_blank_and_errors() {
        assert_eq!(parse_line("   "), None);
        assert!(matches!(parse_line("not json"), Some(SourceEvent::Error(_))));
        assert_eq!(
            parse_line(r#"{"hands": [], "error": "camera busy"}"#),
            Some(SourceEvent::Error("estimator: camera busy".into()))
        );
    }

    #[test]
    fn json_source_streams_then_quits() {
        let input = format!(
            "{{\"hands\": [{}]}}\n\ngarbage\n{{\"hands\": []}}\n",
            hand_json("11111"),
        );
        let rx = spawn_landmark_source(JsonLinesSource::new(Cursor::new(input.into_bytes())));
        let events: Vec<SourceEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], SourceEvent::Frame(f) if f.hands.len() == 1));
        assert!(matches!(events[1], SourceEvent::Error(_)));
        assert!(matches!(&events[2], SourceEvent::Frame(f) if f.hands.is_empty()));
        assert_eq!(events[3], SourceEvent::Quit);
    }

    #[test]
    fn sim_hand_toggles_and_hides() {
        let mut h = SimHand::default();
        assert!(h.frame(None).hands.is_empty());
        assert!(h.apply(SimInput::Toggle(Finger::Index)));
        assert_eq!(h.fingers.to_string(), "01000");
        assert!(h.visible);
        assert_eq!(h.frame(None).hands.len(), 1);
        h.apply(SimInput::ToggleHand);
        assert!(h.frame(None).hands.is_empty());
        assert!(!h.apply(SimInput::Quit));
    }

    #[test]
    fn sim_source_emits_frames_and_quits() {
        let (tx, rx) = mpsc::channel();
        let mut source = SimHandSource::new(rx);
        source.interval = Duration::from_millis(5);
        let events = spawn_landmark_source(source);

        tx.send(SimInput::Set(FingerState::parse("00100").unwrap())).unwrap();
        // Frames from before the input arrived show no hand; skip those.
        let shown = events.iter()
            .find_map(|e| match e {
                SourceEvent::Frame(f) if !f.hands.is_empty() => Some(f),
                _ => None,
            })
            .unwrap();
        let lm = shown.hands[0].validate().unwrap();
        assert_eq!(finger_code::extract(&lm, Default::default()).to_string(), "00100");

        tx.send(SimInput::Quit).unwrap();
        assert!(events.iter().any(|e| e == SourceEvent::Quit));
    }
}
