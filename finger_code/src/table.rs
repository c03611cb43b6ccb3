//! The gesture table: finger state → action.
//!
//! The table is plain data.  It is built once at startup, either from the
//! built-in layout below or from a JSON [`TableConfig`], and never changes
//! afterwards.  Lookup is exact; any state not listed is [`Action::Unmapped`].
//!
//! ## Built-in layout (thumb, index, middle, ring, pinky)
//!
//! | Fingers | Key | Fingers | Key | Fingers | Key |
//! |---|---|---|---|---|---|
//! | `10000` | a | `01010` | k | `10110` | s |
//! | `01000` | b | `01001` | l | `10101` | t |
//! | `00100` | c | `00110` | m | `10011` | u |
//! | `00010` | d | `00101` | n | `01110` | v |
//! | `00001` | e | `00011` | o | `01101` | w |
//! | `11000` | f | `11100` | p | `01011` | x |
//! | `10100` | g | `11010` | q | `00111` | y |
//! | `10010` | h | `11001` | r | `11110` | z |
//! | `10001` | i | `00000` | backspace | `11111` | enter |
//! | `01100` | j | | | | |
//!
//! `11101`, `11011`, `10111` and `01111` are left unassigned.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::fingers::FingerState;

const DEFAULT_LAYOUT: [(&str, &str); 28] = [
    ("10000", "a"), ("01000", "b"), ("00100", "c"), ("00010", "d"),
    ("00001", "e"), ("11000", "f"), ("10100", "g"), ("10010", "h"),
    ("10001", "i"), ("01100", "j"), ("01010", "k"), ("01001", "l"),
    ("00110", "m"), ("00101", "n"), ("00011", "o"), ("11100", "p"),
    ("11010", "q"), ("11001", "r"), ("10110", "s"), ("10101", "t"),
    ("10011", "u"), ("01110", "v"), ("01101", "w"), ("01011", "x"),
    ("00111", "y"), ("11110", "z"),
    ("00000", "backspace"),
    ("11111", "enter"),
];

// ════════════════════════════════════════════════════════════════════════════
// Action
// ════════════════════════════════════════════════════════════════════════════

/// What a gesture asks the keyboard to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Type one printable character.
    Char(char),
    Backspace,
    Enter,
    /// No entry in the table.  Never dispatched.
    Unmapped,
}

impl Action {
    /// Parse a configuration name: a single printable character, or one of
    /// `space`, `backspace`, `enter` (case-insensitive).
    pub fn parse(name: &str) -> Result<Action, TableError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_control() {
                return Ok(Action::Char(c));
            }
        }
        match name.to_ascii_lowercase().as_str() {
            "space"     => Ok(Action::Char(' ')),
            "backspace" => Ok(Action::Backspace),
            "enter"     => Ok(Action::Enter),
            _           => Err(TableError::UnknownAction(name.to_string())),
        }
    }

    /// Configuration name; the inverse of [`Action::parse`].
    pub fn name(&self) -> String {
        match self {
            Action::Char(' ') => "space".to_string(),
            Action::Char(c)   => c.to_string(),
            Action::Backspace => "backspace".to_string(),
            Action::Enter     => "enter".to_string(),
            Action::Unmapped  => "unmapped".to_string(),
        }
    }

    pub fn is_mapped(&self) -> bool { *self != Action::Unmapped }
}

impl fmt::Display for Action {
    /// Upper-case label for status text, e.g. `F`, `ENTER`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().to_uppercase())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TableConfig: serialisable form
// ════════════════════════════════════════════════════════════════════════════

/// One `fingers → action` line of a table configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Thumb-first bit string, e.g. `"11000"`.
    pub fingers: String,
    /// Action name, see [`Action::parse`].
    pub action:  String,
}

/// JSON shape of a gesture table:
///
/// ```json
/// { "entries": [ { "fingers": "11000", "action": "f" },
///                { "fingers": "00000", "action": "backspace" } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub entries: Vec<TableEntry>,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTable
// ════════════════════════════════════════════════════════════════════════════

/// Immutable finger-state → action mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GestureTable {
    map: BTreeMap<FingerState, Action>,
}

impl GestureTable {
    /// Build and validate a table.  Every pattern must parse, every action
    /// must be known, and no pattern may appear twice.
    pub fn from_config(cfg: &TableConfig) -> Result<Self, TableError> {
        let mut map: BTreeMap<FingerState, Action> = BTreeMap::new();
        for entry in &cfg.entries {
            let fingers: FingerState = entry.fingers.parse()?;
            let action = Action::parse(&entry.action)?;
            if let Some(prev) = map.insert(fingers, action) {
                return Err(TableError::Duplicate {
                    fingers: fingers.to_string(),
                    first:   prev.name(),
                    second:  action.name(),
                });
            }
        }
        Ok(GestureTable { map })
    }

    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let cfg: TableConfig = serde_json::from_str(json)?;
        GestureTable::from_config(&cfg)
    }

    /// Exact-match lookup.  Absent states resolve to [`Action::Unmapped`].
    pub fn lookup(&self, fingers: FingerState) -> Action {
        self.map.get(&fingers).copied().unwrap_or(Action::Unmapped)
    }

    /// Entries in ascending finger-state order.
    pub fn entries(&self) -> impl Iterator<Item = (FingerState, Action)> + '_ {
        self.map.iter().map(|(f, a)| (*f, *a))
    }

    pub fn len(&self) -> usize { self.map.len() }
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn to_config(&self) -> TableConfig {
        TableConfig {
            entries: self.entries()
                .map(|(f, a)| TableEntry { fingers: f.to_string(), action: a.name() })
                .collect(),
        }
    }
}

impl Default for GestureTable {
    fn default() -> Self {
        let map = DEFAULT_LAYOUT.iter()
            .filter_map(|(f, a)| Some((FingerState::parse(f)?, Action::parse(a).ok()?)))
            .collect();
        GestureTable { map }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn fs(s: &str) -> FingerState { FingerState::parse(s).unwrap() }

    fn entry(f: &str, a: &str) -> TableEntry {
        TableEntry { fingers: f.to_string(), action: a.to_string() }
    }

    // ── Action ───────────────────────────────────────────────────────────
    #[test]
    fn action_parse_names() {
        assert_eq!(Action::parse("q").unwrap(), Action::Char('q'));
        assert_eq!(Action::parse("Q").unwrap(), Action::Char('Q'));
        assert_eq!(Action::parse("Space").unwrap(), Action::Char(' '));
        assert_eq!(Action::parse("BACKSPACE").unwrap(), Action::Backspace);
        assert_eq!(Action::parse("enter").unwrap(), Action::Enter);
        assert!(Action::parse("unmapped").is_err());
        assert!(Action::parse("").is_err());
        assert!(Action::parse("\n").is_err());
        assert!(Action::parse("ctrl").is_err());
    }

    #[test]
    fn action_display_is_upper_case() {
        assert_eq!(Action::Char('f').to_string(), "F");
        assert_eq!(Action::Enter.to_string(), "ENTER");
        assert_eq!(Action::Char(' ').to_string(), "SPACE");
    }

    // ── default layout ───────────────────────────────────────────────────
    #[test]
    fn default_has_every_letter_once() {
        let t = GestureTable::default();
        assert_eq!(t.len(), 28);
        let letters: HashSet<char> = t.entries()
            .filter_map(|(_, a)| match a { Action::Char(c) => Some(c), _ => None })
            .collect();
        assert_eq!(letters, ('a'..='z').collect());
    }

    #[test]
    fn default_special_keys() {
        let t = GestureTable::default();
        assert_eq!(t.lookup(FingerState::ALL_DOWN), Action::Backspace);
        assert_eq!(t.lookup(FingerState::ALL_UP), Action::Enter);
        assert_eq!(t.lookup(fs("11000")), Action::Char('f'));
        assert_eq!(t.lookup(fs("11110")), Action::Char('z'));
    }

    #[test]
    fn default_leaves_four_states_unmapped() {
        let t = GestureTable::default();
        let unmapped: Vec<String> = FingerState::all()
            .filter(|s| t.lookup(*s) == Action::Unmapped)
            .map(|s| s.to_string())
            .collect();
        assert_eq!(unmapped, vec!["01111", "10111", "11011", "11101"]);
    }

    // ── configuration ────────────────────────────────────────────────────
    #[test]
    fn config_round_trips_default() {
        let t = GestureTable::default();
        assert_eq!(GestureTable::from_config(&t.to_config()).unwrap(), t);
    }

    #[test]
    fn from_json_custom_table() {
        let t = GestureTable::from_json(r#"{ "entries": [
            { "fingers": "01000", "action": "space" },
            { "fingers": "00000", "action": "backspace" }
        ] }"#).unwrap();
        assert_eq!(t.lookup(fs("01000")), Action::Char(' '));
        assert_eq!(t.lookup(fs("11111")), Action::Unmapped);
    }

    #[test]
    fn duplicate_pattern_rejected() {
        let cfg = TableConfig { entries: vec![entry("10000", "a"), entry("10000", "b")] };
        match GestureTable::from_config(&cfg) {
            Err(TableError::Duplicate { fingers, first, second }) => {
                assert_eq!(fingers, "10000");
                assert_eq!(first, "a");
                assert_eq!(second, "b");
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn bad_pattern_rejected() {
        let cfg = TableConfig { entries: vec![entry("1000", "a")] };
        assert!(matches!(GestureTable::from_config(&cfg), Err(TableError::BadFingers(_))));
    }

    #[test]
    fn unknown_action_rejected() {
        let cfg = TableConfig { entries: vec![entry("10000", "escape")] };
        assert!(matches!(GestureTable::from_config(&cfg), Err(TableError::UnknownAction(_))));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(GestureTable::from_json("{ entries: "), Err(TableError::Json(_))));
    }

    proptest! {
        #[test]
        fn lookup_is_total(bits in proptest::array::uniform5(0u8..2)) {
            let t = GestureTable::default();
            let s = FingerState::from_bits(bits);
            let a = t.lookup(s);
            prop_assert_eq!(a.is_mapped(), t.entries().any(|(f, _)| f == s));
        }
    }
}
