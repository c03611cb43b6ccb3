//! Action sinks: where fired keys go.
//!
//! The app only ever hands a sink actions that passed the dispatch gate, so
//! `Unmapped` never arrives here.

use std::sync::{Arc, Mutex};

use tracing::info;

use finger_code::Action;

use crate::error::SinkError;

// ════════════════════════════════════════════════════════════════════════════
// ActionSink trait
// ════════════════════════════════════════════════════════════════════════════

pub trait ActionSink {
    fn emit(&mut self, action: &Action) -> Result<(), SinkError>;

    /// Short name for the status line.
    fn name(&self) -> &'static str;
}

// ── stdout backend ────────────────────────────────────────────────────────

/// Prints each key instead of typing it.
#[derive(Debug, Default)]
pub struct LogSink;

impl ActionSink for LogSink {
    fn emit(&mut self, action: &Action) -> Result<(), SinkError> {
        info!(%action, "key");
        println!("Pressed: {}", action);
        Ok(())
    }

    fn name(&self) -> &'static str { "print" }
}

// ── in-memory backend ─────────────────────────────────────────────────────

/// Keeps every emitted action, for tests and embedding.  Clones share one
/// log, so a handle kept by the caller still sees actions after the sink
/// has been boxed and handed to the app.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<Action>>>,
}

impl RecordingSink {
    pub fn new() -> Self { RecordingSink::default() }

    /// Everything emitted so far, oldest first.
    pub fn actions(&self) -> Vec<Action> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ActionSink for RecordingSink {
    fn emit(&mut self, action: &Action) -> Result<(), SinkError> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).push(*action);
        Ok(())
    }

    fn name(&self) -> &'static str { "record" }
}

// ── enigo backend ─────────────────────────────────────────────────────────

/// Types into whatever window has keyboard focus.
#[cfg(feature = "inject")]
pub struct KeySink {
    enigo: enigo::Enigo,
}

#[cfg(feature = "inject")]
impl KeySink {
    pub fn new() -> Self { KeySink { enigo: enigo::Enigo::new() } }
}

#[cfg(feature = "inject")]
impl ActionSink for KeySink {
    fn emit(&mut self, action: &Action) -> Result<(), SinkError> {
        use enigo::{Key, KeyboardControllable};

        let key = match action {
            Action::Char(' ')  => Key::Space,
            Action::Char(c)    => Key::Layout(*c),
            Action::Backspace  => Key::Backspace,
            Action::Enter      => Key::Return,
            Action::Unmapped   => {
                return Err(SinkError::Inject("unmapped gesture reached the key sink".into()));
            }
        };
        self.enigo.key_click(key);
        info!(%action, "key injected");
        Ok(())
    }

    fn name(&self) -> &'static str { "inject" }
}

// ════════════════════════════════════════════════════════════════════════════
// open_sink: pick a backend
// ════════════════════════════════════════════════════════════════════════════

/// Key injection when asked for and compiled in, otherwise printing.
pub fn open_sink(inject: bool) -> Box<dyn ActionSink> {
    if !inject {
        return Box::new(LogSink);
    }

    #[cfg(feature = "inject")]
    {
        Box::new(KeySink::new())
    }

    #[cfg(not(feature = "inject"))]
    {
        tracing::warn!("built without the `inject` feature; printing keys instead of typing them");
        Box::new(LogSink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let mut s = RecordingSink::new();
        s.emit(&Action::Char('h')).unwrap();
        s.emit(&Action::Backspace).unwrap();
        s.emit(&Action::Enter).unwrap();
        assert_eq!(s.actions(), vec![Action::Char('h'), Action::Backspace, Action::Enter]);
    }

    #[test]
    fn recording_sink_clones_share_the_log() {
        let handle = RecordingSink::new();
        let mut boxed: Box<dyn ActionSink> = Box::new(handle.clone());
        boxed.emit(&Action::Char('x')).unwrap();
        assert_eq!(handle.actions(), vec![Action::Char('x')]);
    }

    #[test]
    fn no_inject_always_prints() {
        assert_eq!(open_sink(false).name(), "print");
    }

    #[cfg(not(feature = "inject"))]
    #[test]
    fn inject_without_feature_falls_back() {
        assert_eq!(open_sink(true).name(), "print");
    }
}
